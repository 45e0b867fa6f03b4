use crate::error::{NotifierError, Result};
use std::path::Path;

/// Placeholder names a body template may reference
pub const PLACEHOLDERS: &[&str] = &["url", "current_activity_name", "activity_id", "external_id"];

/// Values substituted into the email body templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    pub url: String,
    pub current_activity_name: String,
    pub activity_id: String,
    pub external_id: String,
}

impl TemplateValues {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "url" => Some(&self.url),
            "current_activity_name" => Some(&self.current_activity_name),
            "activity_id" => Some(&self.activity_id),
            "external_id" => Some(&self.external_id),
            _ => None,
        }
    }
}

/// Loads a template from disk and fills it in.
///
/// The file is read on every call; leading and trailing whitespace is trimmed
/// before substitution.
pub async fn render_template_file(path: &Path, values: &TemplateValues) -> Result<String> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        NotifierError::Template(format!("cannot read {}: {}", path.display(), e))
    })?;

    render(raw.trim(), values)
        .map_err(|e| NotifierError::Template(format!("{}: {}", path.display(), e)))
}

/// Strict `{name}` substitution.
///
/// `{{` and `}}` are literal braces. Unknown names, unterminated `{` and
/// stray `}` are errors rather than being passed through.
pub fn render(template: &str, values: &TemplateValues) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }

                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    match c {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => return Err(format!("nested '{{' in placeholder at byte {}", pos)),
                        _ => name.push(c),
                    }
                }
                if !closed {
                    return Err(format!("unterminated placeholder at byte {}", pos));
                }

                match values.lookup(&name) {
                    Some(value) => out.push_str(value),
                    None => return Err(format!("unknown placeholder {{{}}}", name)),
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(format!("single '}}' at byte {}", pos));
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn values() -> TemplateValues {
        TemplateValues {
            url: "https://b.s3.amazonaws.com/k?sig=1".to_string(),
            current_activity_name: "Morning Ride".to_string(),
            activity_id: "123".to_string(),
            external_id: "f.fit".to_string(),
        }
    }

    #[test]
    fn test_render_all_placeholders() {
        let out = render(
            "Ride {current_activity_name} ({activity_id}, {external_id}): {url}",
            &values(),
        )
        .unwrap();
        assert_eq!(
            out,
            "Ride Morning Ride (123, f.fit): https://b.s3.amazonaws.com/k?sig=1"
        );
    }

    #[test]
    fn test_render_escaped_braces() {
        let out = render("p {{ color: red; }} {activity_id}", &values()).unwrap();
        assert_eq!(out, "p { color: red; } 123");
    }

    #[test]
    fn test_render_rejects_unknown_and_malformed() {
        assert!(render("{athlete}", &values()).unwrap_err().contains("athlete"));
        assert!(render("{}", &values()).is_err());
        assert!(render("open {url", &values()).is_err());
        assert!(render("close }", &values()).is_err());
        assert!(render("{ur{l}", &values()).is_err());
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let mut v = values();
        v.current_activity_name = "{url} }{".to_string();
        let out = render("{current_activity_name}", &v).unwrap();
        assert_eq!(out, "{url} }{");
    }

    #[tokio::test]
    async fn test_render_file_trims_and_substitutes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\n  <a href=\"{{url}}\">{{current_activity_name}}</a>  \n").unwrap();
        let out = render_template_file(file.path(), &values()).await.unwrap();
        assert_eq!(
            out,
            "<a href=\"https://b.s3.amazonaws.com/k?sig=1\">Morning Ride</a>"
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_template_file(&dir.path().join("nope.txt"), &values())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifierError::Template(_)));
    }
}
