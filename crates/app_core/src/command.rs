//! Command system for user actions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Command identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub String);

impl CommandId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    // Navigation commands
    pub const NAV_CHANGE_DIR: &'static str = "nav.change_dir";
    pub const NAV_BACK: &'static str = "nav.back";
    pub const NAV_FORWARD: &'static str = "nav.forward";
    pub const NAV_UP: &'static str = "nav.up";
    pub const NAV_PRINT_DIR: &'static str = "nav.print_dir";

    // View commands
    pub const VIEW_LIST: &'static str = "view.list";
    pub const VIEW_SEARCH: &'static str = "view.search";
    pub const VIEW_FILTER: &'static str = "view.filter";
    pub const VIEW_SORT: &'static str = "view.sort";
    pub const VIEW_MODE: &'static str = "view.mode";
    pub const VIEW_RECENT: &'static str = "view.recent";
    pub const VIEW_STARRED: &'static str = "view.starred";
    pub const VIEW_TRANSFERS: &'static str = "view.transfers";

    // Selection commands
    pub const SELECT_ITEM: &'static str = "select.item";
    pub const SELECT_ALL: &'static str = "select.all";
    pub const SELECT_CLEAR: &'static str = "select.clear";

    // File commands
    pub const FILE_NEW_FOLDER: &'static str = "file.new_folder";
    pub const FILE_UPLOAD: &'static str = "file.upload";
    pub const FILE_OPEN: &'static str = "file.open";
    pub const FILE_DELETE: &'static str = "file.delete";
    pub const FILE_RENAME: &'static str = "file.rename";
    pub const FILE_COPY: &'static str = "file.copy";
    pub const FILE_CUT: &'static str = "file.cut";
    pub const FILE_PASTE: &'static str = "file.paste";
    pub const FILE_MOVE_TO: &'static str = "file.move_to";
    pub const FILE_COPY_TO: &'static str = "file.copy_to";

    // Metadata commands
    pub const META_STAR: &'static str = "meta.star";
    pub const META_SHARE: &'static str = "meta.share";
    pub const META_TAG: &'static str = "meta.tag";
    pub const META_UNTAG: &'static str = "meta.untag";

    // App commands
    pub const APP_HELP: &'static str = "app.help";
    pub const APP_QUIT: &'static str = "app.quit";
}

/// Command with optional parameters
#[derive(Debug, Clone)]
pub struct Command {
    pub id: CommandId,
    pub params: CommandParams,
}

/// Command parameters: the words following the command name
#[derive(Debug, Clone, Default)]
pub struct CommandParams {
    pub list_value: Vec<String>,
}

impl CommandParams {
    /// Argument at `index`; `what` names it in the error
    pub fn arg(&self, index: usize, what: &str) -> anyhow::Result<&str> {
        self.list_value
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| anyhow::anyhow!("missing {}", what))
    }
}

impl Command {
    pub fn new(id: &str) -> Self {
        Self {
            id: CommandId::new(id),
            params: CommandParams::default(),
        }
    }

    pub fn with_list<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.list_value = values.into_iter().map(Into::into).collect();
        self
    }
}

/// What a handler produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    /// Text for the user
    Output(String),
    /// No handler, or the handler declined
    Ignored,
    /// Stop the session
    Quit,
}

/// Command handler trait
pub trait CommandHandler: Send + Sync {
    fn execute(&self, cmd: &Command) -> anyhow::Result<CommandOutcome>;
    fn can_execute(&self, cmd: &Command) -> bool;
}

/// Handler backed by a closure
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Command) -> anyhow::Result<CommandOutcome> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&Command) -> anyhow::Result<CommandOutcome> + Send + Sync,
{
    fn execute(&self, cmd: &Command) -> anyhow::Result<CommandOutcome> {
        (self.f)(cmd)
    }

    fn can_execute(&self, _cmd: &Command) -> bool {
        true
    }
}

/// Command dispatcher
pub struct CommandDispatcher {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, command_id: &str, handler: H) {
        self.handlers.insert(command_id.to_string(), Box::new(handler));
    }

    /// Register a closure as the handler for `command_id`
    pub fn register_fn<F>(&mut self, command_id: &str, f: F)
    where
        F: Fn(&Command) -> anyhow::Result<CommandOutcome> + Send + Sync + 'static,
    {
        self.register(command_id, FnHandler::new(f));
    }

    pub fn dispatch(&self, cmd: &Command) -> anyhow::Result<CommandOutcome> {
        if let Some(handler) = self.handlers.get(cmd.id.as_str()) {
            if handler.can_execute(cmd) {
                return handler.execute(cmd);
            }
            tracing::debug!("Command {} cannot be executed in current context", cmd.id.as_str());
        } else {
            tracing::warn!("Unknown command: {}", cmd.id.as_str());
        }
        Ok(CommandOutcome::Ignored)
    }

    pub fn can_execute(&self, cmd: &Command) -> bool {
        self.handlers
            .get(cmd.id.as_str())
            .map(|h| h.can_execute(cmd))
            .unwrap_or(false)
    }

    /// Registered command ids, sorted
    pub fn command_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ReadOnly;

    impl CommandHandler for ReadOnly {
        fn execute(&self, _cmd: &Command) -> anyhow::Result<CommandOutcome> {
            Ok(CommandOutcome::Done)
        }

        fn can_execute(&self, cmd: &Command) -> bool {
            !cmd.params.list_value.is_empty()
        }
    }

    #[test]
    fn test_dispatch_to_closure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register_fn(CommandId::FILE_NEW_FOLDER, move |cmd| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(CommandOutcome::Output(cmd.params.arg(0, "name")?.to_string()))
        });

        let out = dispatcher
            .dispatch(&Command::new(CommandId::FILE_NEW_FOLDER).with_list(["Docs"]))
            .unwrap();
        assert_eq!(out, CommandOutcome::Output("Docs".into()));
        assert!(dispatcher.dispatch(&Command::new(CommandId::FILE_NEW_FOLDER)).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_and_declined_are_ignored() {
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(CommandId::VIEW_LIST, ReadOnly);

        assert_eq!(
            dispatcher.dispatch(&Command::new("nope")).unwrap(),
            CommandOutcome::Ignored
        );
        assert_eq!(
            dispatcher.dispatch(&Command::new(CommandId::VIEW_LIST)).unwrap(),
            CommandOutcome::Ignored
        );
        assert!(dispatcher.can_execute(&Command::new(CommandId::VIEW_LIST).with_list(["x"])));
        assert_eq!(dispatcher.command_ids(), vec![CommandId::VIEW_LIST]);
    }

    #[test]
    fn test_list_params() {
        let cmd = Command::new(CommandId::META_SHARE).with_list(["bob", "carol"]);
        assert_eq!(cmd.params.list_value, vec!["bob".to_string(), "carol".to_string()]);
        assert_eq!(cmd.params.arg(1, "user").unwrap(), "carol");
        let err = cmd.params.arg(2, "user").unwrap_err();
        assert_eq!(err.to_string(), "missing user");
    }
}
