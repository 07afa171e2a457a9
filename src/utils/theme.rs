use colored::Colorize;

pub struct Theme {
    pub prompt: String,
    pub error_style: Box<dyn Fn(&str) -> String>,
    pub notice_style: Box<dyn Fn(&str) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt: "> ".bright_cyan().to_string(),
            error_style: Box::new(|s: &str| s.bright_red().to_string()),
            notice_style: Box::new(|s: &str| s.bright_magenta().to_string()),
        }
    }
}

impl Theme {
    /// No escape sequences at all, for dumb terminals and logs of sessions.
    pub fn plain() -> Self {
        Theme {
            prompt: "> ".to_string(),
            error_style: Box::new(|s: &str| s.to_string()),
            notice_style: Box::new(|s: &str| s.to_string()),
        }
    }

    pub fn error(&self, message: &str) -> String {
        (self.error_style)(message)
    }

    pub fn notice(&self, message: &str) -> String {
        (self.notice_style)(message)
    }
}

pub fn load_theme(theme_name: &str) -> Theme {
    match theme_name {
        "plain" => Theme::plain(),
        "dark" => Theme {
            prompt: "➤ ".bright_purple().to_string(),
            error_style: Box::new(|s: &str| s.red().to_string()),
            notice_style: Box::new(|s: &str| s.magenta().to_string()),
        },
        _ => Theme::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_theme_leaves_text_alone() {
        let theme = load_theme("plain");
        assert_eq!(theme.prompt, "> ");
        assert_eq!(theme.error("Parse ERROR"), "Parse ERROR");
        assert_eq!(theme.notice("[1]+ done sleep 1 &"), "[1]+ done sleep 1 &");
    }

    #[test]
    fn test_styled_themes_keep_message_text() {
        for name in ["default", "dark", "unknown"] {
            let theme = load_theme(name);
            assert!(theme.error("boom").contains("boom"));
            assert!(theme.notice("done").contains("done"));
            assert!(theme.prompt.contains(' '));
        }
    }
}
