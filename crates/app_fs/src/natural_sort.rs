//! Natural, case-insensitive name ordering

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Part {
    Num(u128),
    Str(String),
}

/// Split a name into digit runs and lowercase text runs
fn natural_key(s: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut digits = String::new();
    let mut text = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            if !text.is_empty() {
                parts.push(Part::Str(text.to_lowercase()));
                text.clear();
            }
            digits.push(c);
        } else {
            if !digits.is_empty() {
                parts.push(number_part(&digits));
                digits.clear();
            }
            text.push(c);
        }
    }

    if !digits.is_empty() {
        parts.push(number_part(&digits));
    }
    if !text.is_empty() {
        parts.push(Part::Str(text.to_lowercase()));
    }

    parts
}

// Overlong digit runs fall back to text comparison
fn number_part(digits: &str) -> Part {
    digits
        .parse::<u128>()
        .map(Part::Num)
        .unwrap_or_else(|_| Part::Str(digits.to_string()))
}

/// Compare two names so that "image2.jpg" < "image10.jpg"
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_sort() {
        let mut names = vec!["image10.jpg", "image2.jpg", "image1.jpg", "image20.jpg"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["image1.jpg", "image2.jpg", "image10.jpg", "image20.jpg"]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(natural_cmp("Docs", "docs"), Ordering::Equal);
        assert_eq!(natural_cmp("alpha", "Beta"), Ordering::Less);
    }
}
