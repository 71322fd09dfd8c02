//! Interactive Pages prompt

use crate::cli::style::Stylize;
use anstream::println;
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use std::io::IsTerminal;
use webroot_git::sync::{PagesChoice, PagesPrompt};
use webroot_git::types::PagesStatus;

/// Asks on the terminal; answers `SkipPr` when there is no terminal
pub struct DialoguerPrompt;

impl PagesPrompt for DialoguerPrompt {
    fn choose(&self, repo: &str, owner: &str, status: PagesStatus) -> PagesChoice {
        println!(
            "GitHub Pages on {} is {}. Reviewers use it to preview changes.",
            format!("{owner}/{repo}").accent(),
            status.to_string().warn().for_stdout()
        );

        if !std::io::stdin().is_terminal() {
            println!("{}", "No terminal, skipping the pull request".muted());
            return PagesChoice::SkipPr;
        }

        let items = [
            "Open the pull request anyway",
            "Skip the pull request (keep the pushed commit)",
            "Abort",
        ];
        match Select::with_theme(&ColorfulTheme::default())
            .with_prompt("How do you want to continue?")
            .items(&items)
            .default(0)
            .interact()
        {
            Ok(0) => PagesChoice::ProceedWithPr,
            Ok(2) => PagesChoice::AbortCommit,
            _ => PagesChoice::SkipPr,
        }
    }
}
