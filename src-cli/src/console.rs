//! Terminal interaction shared by every command.

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};
use std::fmt::Display;
use std::str::FromStr;

/// Prompts and status lines. With `assume_yes` every prompt takes its default.
pub struct Console {
    assume_yes: bool,
}

impl Console {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    pub fn interactive(&self) -> bool {
        !self.assume_yes
    }

    pub fn theme(&self) -> ColorfulTheme {
        ColorfulTheme::default()
    }

    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.assume_yes {
            return Ok(default);
        }
        Ok(Confirm::with_theme(&self.theme())
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    /// Ask for a value that parses as `T`, re-asking on invalid input.
    pub fn number<T>(&self, prompt: &str, default: T) -> Result<T>
    where
        T: Clone + Display + FromStr,
        T::Err: Display,
    {
        if self.assume_yes {
            return Ok(default);
        }
        Ok(Input::with_theme(&self.theme())
            .with_prompt(prompt)
            .default(default)
            .interact_text()?)
    }

    /// Free text; an empty answer returns `default`.
    pub fn text(&self, prompt: &str, default: &str) -> Result<String> {
        if self.assume_yes {
            return Ok(default.to_string());
        }
        Ok(Input::<String>::with_theme(&self.theme())
            .with_prompt(prompt)
            .default(default.to_string())
            .allow_empty(true)
            .show_default(!default.is_empty())
            .interact_text()?)
    }

    /// Hidden input, always asked.
    pub fn secret(&self, prompt: &str) -> Result<String> {
        Ok(Password::with_theme(&self.theme())
            .with_prompt(prompt)
            .interact()?)
    }

    pub fn select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize> {
        if self.assume_yes {
            return Ok(default);
        }
        Ok(Select::with_theme(&self.theme())
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()?)
    }

    /// Block until the operator presses Enter.
    pub fn wait_for_enter(&self, prompt: &str) -> Result<()> {
        if self.assume_yes {
            return Ok(());
        }
        let _: String = Input::with_theme(&self.theme())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(())
    }

    pub fn header(&self, msg: &str) {
        println!();
        println!("{}", style(msg).bold().cyan());
    }

    pub fn line(&self, msg: &str) {
        println!("  {msg}");
    }

    pub fn success(&self, msg: &str) {
        println!("{}", style(msg).green());
    }

    pub fn warning(&self, msg: &str) {
        println!("{}", style(msg).yellow());
    }

    pub fn failure(&self, msg: &str) {
        eprintln!("{}", style(msg).red().bold());
    }
}
