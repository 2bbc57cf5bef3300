//! Line-oriented command shell over the application state

use anyhow::{anyhow, bail, Result};
use app_core::{
    AppError, AppState, Command, CommandDispatcher, CommandId, CommandOutcome, Entry, EntryId,
    FileStore, Modifiers, SortBy, SortOrder, TypeFilter, UploadDescriptor, ViewMode,
};
use app_fs::VirtualPath;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub struct Shell {
    state: Arc<AppState>,
    dispatcher: CommandDispatcher,
}

impl Shell {
    pub fn new(state: Arc<AppState>) -> Self {
        let mut dispatcher = CommandDispatcher::new();
        register_handlers(&mut dispatcher, &state);
        Self { state, dispatcher }
    }

    /// Turn a line into a command; `None` for blank lines
    pub fn parse(&self, line: &str) -> Result<Option<Command>> {
        let words = split_words(line)?;
        let Some((head, args)) = words.split_first() else {
            return Ok(None);
        };

        let config = self.state.config.read();
        let id = config
            .resolve_alias(head)
            .ok_or_else(|| anyhow!("unknown command '{}', try 'help'", head))?;

        Ok(Some(Command::new(id).with_list(args.iter().cloned())))
    }

    pub fn execute_line(&self, line: &str) -> Result<CommandOutcome> {
        match self.parse(line)? {
            Some(cmd) => {
                tracing::debug!("Executing command: {}", cmd.id.as_str());
                self.dispatcher.dispatch(&cmd)
            }
            None => Ok(CommandOutcome::Done),
        }
    }

    /// Read commands from stdin until `quit` or end of input
    pub async fn run(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = std::io::stdout();

        loop {
            let prompt = self.state.store.read(|s| s.current_path().to_string());
            write!(stdout, "{}> ", prompt)?;
            stdout.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match self.execute_line(&line) {
                Ok(CommandOutcome::Output(text)) => writeln!(stdout, "{}", text)?,
                Ok(CommandOutcome::Quit) => break,
                Ok(CommandOutcome::Ignored) => writeln!(stdout, "Nothing to do")?,
                Ok(CommandOutcome::Done) => {}
                Err(e) => writeln!(stdout, "{}", describe_error(&e))?,
            }
        }

        Ok(())
    }
}

fn describe_error(e: &anyhow::Error) -> String {
    match e.downcast_ref::<AppError>() {
        Some(app) => app.user_message(),
        None => format!("error: {:#}", e),
    }
}

/// Split on whitespace, keeping "double quoted" runs together
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    words.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }

    if in_quotes {
        bail!("unterminated quote");
    }
    if started {
        words.push(current);
    }
    Ok(words)
}

/// Resolve an absolute or relative path argument against `current`
fn resolve_path(current: &VirtualPath, arg: &str) -> std::result::Result<VirtualPath, AppError> {
    let mut path = if arg.starts_with('/') {
        VirtualPath::root()
    } else {
        current.clone()
    };

    for segment in arg.split('/').filter(|s| !s.is_empty() && *s != ".") {
        path = match segment {
            ".." => path.parent().unwrap_or_default(),
            name => path.join(name)?,
        };
    }
    Ok(path)
}

fn resolve_entry(store: &FileStore, arg: &str) -> std::result::Result<EntryId, AppError> {
    let path = resolve_path(store.current_path(), arg)?;
    store
        .registry()
        .get_by_path(&path)
        .map(|e| e.id)
        .ok_or_else(|| AppError::NotFound(path.to_string()))
}

fn resolve_entries(store: &FileStore, args: &[String]) -> std::result::Result<Vec<EntryId>, AppError> {
    args.iter().map(|arg| resolve_entry(store, arg)).collect()
}

fn arg(cmd: &Command, index: usize, what: &str) -> Result<String> {
    cmd.params.arg(index, what).map(str::to_string)
}

/// Format file size for display
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn render_entry(entry: &Entry, selected: bool) -> String {
    let mut flags = Vec::new();
    if entry.is_starred {
        flags.push("starred".to_string());
    }
    if entry.is_shared {
        flags.push(format!("shared:{}", entry.shared_with.join(",")));
    }
    if !entry.tags.is_empty() {
        flags.push(format!("#{}", entry.tags.iter().cloned().collect::<Vec<_>>().join(" #")));
    }

    let size = if entry.is_folder() {
        "-".to_string()
    } else {
        format_size(entry.size)
    };

    format!(
        "{}{} {:>10}  {}  {}{}",
        if selected { '*' } else { ' ' },
        if entry.is_folder() { 'd' } else { '-' },
        size,
        entry.modified_at.format("%Y-%m-%d %H:%M"),
        entry.name,
        if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join("] ["))
        }
    )
}

fn render_listing(store: &FileStore) -> String {
    let listing = store.listing();
    let settings = store.view_settings();

    let mut out = vec![format!(
        "{}  ({} items, {:?} view, sort {:?} {:?}, filter {:?})",
        store
            .breadcrumb()
            .iter()
            .map(|p| p.file_name().unwrap_or("/"))
            .collect::<Vec<_>>()
            .join(" > "),
        listing.len(),
        store.view_mode(),
        settings.sort_by,
        settings.sort_order,
        settings.filter,
    )];
    if !settings.query.is_empty() {
        out.push(format!("search: \"{}\"", settings.query));
    }
    for entry in listing {
        out.push(render_entry(entry, store.selection().contains(&entry.id)));
    }
    out.join("\n")
}

fn render_paths<'a>(title: &str, entries: impl Iterator<Item = &'a Entry>) -> String {
    let lines: Vec<String> = entries.map(|e| format!("  {}", e.path)).collect();
    if lines.is_empty() {
        format!("{}: none", title)
    } else {
        format!("{}:\n{}", title, lines.join("\n"))
    }
}

fn register_handlers(d: &mut CommandDispatcher, state: &Arc<AppState>) {
    let store = Arc::clone(&state.store);

    // ========================================
    // Navigation (nav.*)
    // ========================================

    let s = Arc::clone(&store);
    d.register_fn(CommandId::NAV_CHANGE_DIR, move |cmd| {
        let target = cmd.params.list_value.first().map_or("/", String::as_str);
        s.update(|store| {
            let path = resolve_path(store.current_path(), target)?;
            store.cd(&path)
        })?;
        Ok(CommandOutcome::Done)
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::NAV_BACK, move |_| {
        Ok(if s.update(|store| store.go_back()) {
            CommandOutcome::Done
        } else {
            CommandOutcome::Output("No earlier directory".into())
        })
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::NAV_FORWARD, move |_| {
        Ok(if s.update(|store| store.go_forward()) {
            CommandOutcome::Done
        } else {
            CommandOutcome::Output("No later directory".into())
        })
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::NAV_UP, move |_| {
        Ok(if s.update(|store| store.go_up()) {
            CommandOutcome::Done
        } else {
            CommandOutcome::Output("Already at the root".into())
        })
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::NAV_PRINT_DIR, move |_| {
        Ok(CommandOutcome::Output(s.read(|store| store.current_path().to_string())))
    });

    // ========================================
    // View (view.*)
    // ========================================

    let s = Arc::clone(&store);
    let search = Arc::clone(&state.search);
    d.register_fn(CommandId::VIEW_LIST, move |_| {
        // A pending search applies before listing
        search.flush();
        Ok(CommandOutcome::Output(s.read(render_listing)))
    });

    let search = Arc::clone(&state.search);
    d.register_fn(CommandId::VIEW_SEARCH, move |cmd| {
        search.call(cmd.params.list_value.join(" "));
        Ok(CommandOutcome::Done)
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::VIEW_FILTER, move |cmd| {
        let filter: TypeFilter = arg(cmd, 0, "filter")?.parse().map_err(|e: String| anyhow!(e))?;
        s.update(|store| store.set_filter(filter));
        Ok(CommandOutcome::Done)
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::VIEW_SORT, move |cmd| {
        let sort_by: SortBy = arg(cmd, 0, "sort key")?.parse().map_err(|e: String| anyhow!(e))?;
        let order: Option<SortOrder> = match cmd.params.list_value.get(1) {
            Some(raw) => Some(raw.parse().map_err(|e: String| anyhow!(e))?),
            None => None,
        };
        s.update(|store| {
            let order = order.unwrap_or(store.view_settings().sort_order);
            store.set_sort(sort_by, order);
        });
        Ok(CommandOutcome::Done)
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::VIEW_MODE, move |cmd| {
        let mode: ViewMode = arg(cmd, 0, "view mode")?.parse().map_err(|e: String| anyhow!(e))?;
        s.update(|store| store.set_view_mode(mode));
        Ok(CommandOutcome::Done)
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::VIEW_RECENT, move |_| {
        Ok(CommandOutcome::Output(s.read(|store| {
            render_paths("Recent", store.registry().recents().into_iter())
        })))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::VIEW_STARRED, move |_| {
        Ok(CommandOutcome::Output(s.read(|store| {
            render_paths("Starred", store.registry().starred().into_iter())
        })))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::VIEW_TRANSFERS, move |_| {
        let text = s.read(|store| {
            let lines: Vec<String> = store
                .transfers()
                .iter()
                .map(|t| {
                    format!(
                        "  {} {} -> {}  {:.0}%  {}/s  {:?}",
                        t.id,
                        t.file_name,
                        t.parent_path,
                        t.progress,
                        format_size(t.speed),
                        t.status
                    )
                })
                .collect();
            if lines.is_empty() {
                "No transfers".to_string()
            } else {
                lines.join("\n")
            }
        });
        Ok(CommandOutcome::Output(text))
    });

    // ========================================
    // Selection (select.*)
    // ========================================

    let s = Arc::clone(&store);
    d.register_fn(CommandId::SELECT_ITEM, move |cmd| {
        let mut modifiers = Modifiers::NONE;
        let mut names = Vec::new();
        for word in &cmd.params.list_value {
            match word.as_str() {
                "--ctrl" => modifiers.ctrl = true,
                "--shift" => modifiers.shift = true,
                _ => names.push(word.clone()),
            }
        }
        if names.is_empty() {
            bail!("missing entry name");
        }

        let count = s.update(|store| {
            for name in &names {
                let id = resolve_entry(store, name)?;
                store.select(id, modifiers)?;
            }
            Ok::<_, AppError>(store.selection().len())
        })?;
        Ok(CommandOutcome::Output(format!("{} selected", count)))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::SELECT_ALL, move |_| {
        let count = s.update(|store| {
            store.select_all();
            store.selection().len()
        });
        Ok(CommandOutcome::Output(format!("{} selected", count)))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::SELECT_CLEAR, move |_| {
        s.update(|store| store.clear_selection());
        Ok(CommandOutcome::Done)
    });

    // ========================================
    // File (file.*)
    // ========================================

    let s = Arc::clone(&store);
    d.register_fn(CommandId::FILE_NEW_FOLDER, move |cmd| {
        let name = arg(cmd, 0, "folder name")?;
        let entry = s.update(|store| store.create_folder(&name))?;
        Ok(CommandOutcome::Output(format!("Created {}", entry.path)))
    });

    let transfers = Arc::clone(&state.transfers);
    d.register_fn(CommandId::FILE_UPLOAD, move |cmd| {
        let args = &cmd.params.list_value;
        if args.is_empty() || args.len() % 2 != 0 {
            bail!("usage: upload <name> <size> [<name> <size> ...]");
        }

        let files = args
            .chunks(2)
            .map(|pair| -> Result<UploadDescriptor> {
                let size: u64 = pair[1]
                    .parse()
                    .map_err(|_| anyhow!("invalid size '{}'", pair[1]))?;
                Ok(UploadDescriptor::new(pair[0].clone(), size))
            })
            .collect::<Result<Vec<_>>>()?;

        let ids = transfers.upload(files)?;
        Ok(CommandOutcome::Output(format!("{} upload(s) started", ids.len())))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::FILE_OPEN, move |cmd| {
        let name = arg(cmd, 0, "entry name")?;
        let opened = s.update(|store| {
            let id = resolve_entry(store, &name)?;
            let folder = store.registry().get(&id).filter(|e| e.is_folder()).map(|e| e.path.clone());
            match folder {
                Some(path) => store.cd(&path).map(|_| None),
                None => store.open(&id).map(|_| Some(id)),
            }
        })?;
        Ok(match opened {
            Some(id) => CommandOutcome::Output(format!("Opened {}", id)),
            None => CommandOutcome::Done,
        })
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::FILE_RENAME, move |cmd| {
        let name = arg(cmd, 0, "entry name")?;
        let new_name = arg(cmd, 1, "new name")?;
        let entry = s.update(|store| {
            let id = resolve_entry(store, &name)?;
            store.rename(&id, &new_name)
        })?;
        Ok(CommandOutcome::Output(format!("Renamed to {}", entry.path)))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::FILE_MOVE_TO, move |cmd| {
        let Some((dest, names)) = cmd.params.list_value.split_last().filter(|(_, n)| !n.is_empty()) else {
            bail!("usage: mv <name>... <destination>");
        };
        let moved = s.update(|store| {
            let ids = resolve_entries(store, names)?;
            let dest = resolve_path(store.current_path(), dest)?;
            store.move_entries(&ids, &dest)
        })?;
        Ok(CommandOutcome::Output(format!("{} moved", moved.len())))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::FILE_COPY_TO, move |cmd| {
        let Some((dest, names)) = cmd.params.list_value.split_last().filter(|(_, n)| !n.is_empty()) else {
            bail!("usage: cp <name>... <destination>");
        };
        let copies = s.update(|store| {
            let ids = resolve_entries(store, names)?;
            let dest = resolve_path(store.current_path(), dest)?;
            store.copy_entries(&ids, &dest)
        })?;
        let paths: Vec<String> = copies.iter().map(|e| e.path.to_string()).collect();
        Ok(CommandOutcome::Output(format!("Copied to {}", paths.join(", "))))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::FILE_DELETE, move |cmd| {
        let names = &cmd.params.list_value;
        let removed = s.update(|store| {
            if names.is_empty() {
                store.delete_selection()
            } else {
                let ids = resolve_entries(store, names)?;
                store.delete(&ids)
            }
        })?;
        Ok(CommandOutcome::Output(format!("{} deleted", removed.len())))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::FILE_COPY, move |_| {
        let count = s.update(|store| store.copy_selection())?;
        Ok(CommandOutcome::Output(format!("{} copied to clipboard", count)))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::FILE_CUT, move |_| {
        let count = s.update(|store| store.cut_selection())?;
        Ok(CommandOutcome::Output(format!("{} cut to clipboard", count)))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::FILE_PASTE, move |cmd| {
        let dest = cmd.params.list_value.first().cloned();
        let pasted = s.update(|store| match dest {
            Some(dest) => {
                let dest = resolve_path(store.current_path(), &dest)?;
                store.paste_into(&dest)
            }
            None => store.paste(),
        })?;
        Ok(CommandOutcome::Output(format!("{} pasted", pasted.len())))
    });

    // ========================================
    // Metadata (meta.*)
    // ========================================

    let s = Arc::clone(&store);
    d.register_fn(CommandId::META_STAR, move |cmd| {
        let name = arg(cmd, 0, "entry name")?;
        let starred = s.update(|store| {
            let id = resolve_entry(store, &name)?;
            store.toggle_star(&id)
        })?;
        Ok(CommandOutcome::Output(
            if starred { "Starred" } else { "Unstarred" }.to_string(),
        ))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::META_SHARE, move |cmd| {
        let name = arg(cmd, 0, "entry name")?;
        let recipients = cmd.params.list_value[1..].to_vec();
        s.update(|store| {
            let id = resolve_entry(store, &name)?;
            store.share(&[id], &recipients)
        })?;
        Ok(CommandOutcome::Output(if recipients.is_empty() {
            "Sharing removed".to_string()
        } else {
            format!("Shared with {}", recipients.join(", "))
        }))
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::META_TAG, move |cmd| {
        let name = arg(cmd, 0, "entry name")?;
        let tag = arg(cmd, 1, "tag")?;
        s.update(|store| {
            let id = resolve_entry(store, &name)?;
            store.add_tag(&id, &tag)
        })?;
        Ok(CommandOutcome::Done)
    });

    let s = Arc::clone(&store);
    d.register_fn(CommandId::META_UNTAG, move |cmd| {
        let name = arg(cmd, 0, "entry name")?;
        let tag = arg(cmd, 1, "tag")?;
        s.update(|store| {
            let id = resolve_entry(store, &name)?;
            store.remove_tag(&id, &tag)
        })?;
        Ok(CommandOutcome::Done)
    });

    // ========================================
    // App (app.*)
    // ========================================

    let st = Arc::clone(state);
    d.register_fn(CommandId::APP_HELP, move |_| {
        let config = st.config.read();
        let mut lines: Vec<String> = config
            .aliases
            .iter()
            .map(|(id, words)| format!("  {:<12} {}", words.join(", "), id))
            .collect();
        lines.sort();
        Ok(CommandOutcome::Output(format!("Commands:\n{}", lines.join("\n"))))
    });

    d.register_fn(CommandId::APP_QUIT, |_| Ok(CommandOutcome::Quit));
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::{AppConfig, MemoryPersistence};
    use std::time::Duration;

    fn shell() -> Shell {
        let state = AppState::with_persistence(AppConfig::default(), MemoryPersistence::new());
        Shell::new(Arc::new(state))
    }

    fn run(shell: &Shell, line: &str) -> CommandOutcome {
        shell.execute_line(line).unwrap()
    }

    fn output(shell: &Shell, line: &str) -> String {
        match run(shell, line) {
            CommandOutcome::Output(text) => text,
            other => panic!("expected output from '{}', got {:?}", line, other),
        }
    }

    fn exists(shell: &Shell, path: &str) -> bool {
        let path = VirtualPath::parse(path).unwrap();
        shell.state.store.read(|s| s.registry().get_by_path(&path).is_some())
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("  mkdir  \"My Docs\" x ").unwrap(), vec!["mkdir", "My Docs", "x"]);
        assert_eq!(split_words("share a.txt \"\"").unwrap(), vec!["share", "a.txt", ""]);
        assert!(split_words("mkdir \"open").is_err());
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[test]
    fn test_resolve_path() {
        let current = VirtualPath::parse("/Docs/2024").unwrap();
        assert_eq!(resolve_path(&current, "..").unwrap().as_str(), "/Docs");
        assert_eq!(resolve_path(&current, "../../..").unwrap().as_str(), "/");
        assert_eq!(resolve_path(&current, "/Music").unwrap().as_str(), "/Music");
        assert_eq!(resolve_path(&current, "./a.txt").unwrap().as_str(), "/Docs/2024/a.txt");
    }

    #[test]
    fn test_folder_workflow() {
        let sh = shell();
        assert_eq!(output(&sh, "mkdir Docs"), "Created /Docs");
        run(&sh, "mkdir Images");
        run(&sh, "cd Docs");
        assert_eq!(output(&sh, "pwd"), "/Docs");
        run(&sh, "mkdir Inner");
        run(&sh, "cd ..");

        run(&sh, "rename Docs Papers");
        assert!(exists(&sh, "/Papers/Inner"));

        run(&sh, "select Papers");
        run(&sh, "cut");
        run(&sh, "paste Images");
        assert!(exists(&sh, "/Images/Papers/Inner"));
        assert!(!exists(&sh, "/Papers"));

        let listing = output(&sh, "ls");
        assert!(listing.contains("Images"));
        assert!(!listing.contains("Papers"));
    }

    #[test]
    fn test_errors_are_reported_not_fatal() {
        let sh = shell();
        run(&sh, "mkdir Docs");
        let err = sh.execute_line("mkdir Docs").unwrap_err();
        assert_eq!(describe_error(&err), "An item named /Docs already exists");

        let err = sh.execute_line("copy").unwrap_err();
        assert!(err.downcast_ref::<AppError>().map_or(false, AppError::is_noop));

        assert!(sh.execute_line("frobnicate").is_err());
        assert!(sh.execute_line("cd missing").is_err());
        assert_eq!(run(&sh, ""), CommandOutcome::Done);
        assert_eq!(run(&sh, "quit"), CommandOutcome::Quit);
    }

    #[test]
    fn test_metadata_commands() {
        let sh = shell();
        run(&sh, "mkdir Docs");
        assert_eq!(output(&sh, "star Docs"), "Starred");
        assert_eq!(output(&sh, "share Docs bob carol"), "Shared with bob, carol");
        run(&sh, "tag Docs work");

        let listing = output(&sh, "ls");
        assert!(listing.contains("[starred]"));
        assert!(listing.contains("shared:bob,carol"));
        assert!(listing.contains("#work"));
        assert!(output(&sh, "starred").contains("/Docs"));

        assert_eq!(output(&sh, "share Docs"), "Sharing removed");
        run(&sh, "untag Docs work");
        assert!(!output(&sh, "ls").contains("#work"));
    }

    #[test]
    fn test_view_commands() {
        let sh = shell();
        run(&sh, "sort size desc");
        run(&sh, "view list");
        run(&sh, "filter images");
        let state = sh.state.store.read(|s| (s.view_settings().clone(), s.view_mode()));
        assert_eq!(state.0.sort_by, SortBy::Size);
        assert_eq!(state.0.sort_order, SortOrder::Descending);
        assert_eq!(state.0.filter, TypeFilter::Image);
        assert_eq!(state.1, ViewMode::List);
        assert!(sh.execute_line("sort colour").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_and_search() {
        let sh = shell();
        assert_eq!(output(&sh, "upload report.pdf 2048 photo.png 10"), "2 upload(s) started");
        assert!(output(&sh, "transfers").contains("report.pdf"));

        let mut waited = 0;
        while !(exists(&sh, "/report.pdf") && exists(&sh, "/photo.png")) {
            tokio::time::sleep(Duration::from_millis(200)).await;
            waited += 1;
            assert!(waited < 2000, "uploads never finished");
        }
        assert!(output(&sh, "recent").contains("/photo.png"));

        run(&sh, "search REPORT");
        let listing = output(&sh, "ls");
        assert!(listing.contains("report.pdf"));
        assert!(!listing.contains("photo.png"));

        assert!(sh.execute_line("upload a.txt lots").is_err());
    }
}
