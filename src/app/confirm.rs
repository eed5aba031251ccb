use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Prompts on stderr and reads a `y`/`n` answer from a reader (stdin in the CLI).
pub struct PromptConfirm<R> {
    input: R,
    assume_yes: bool,
}

impl PromptConfirm<std::io::StdinLock<'static>> {
    pub fn stdin(assume_yes: bool) -> Self {
        PromptConfirm {
            input: std::io::stdin().lock(),
            assume_yes,
        }
    }
}

impl<R: BufRead> PromptConfirm<R> {
    pub fn new(input: R, assume_yes: bool) -> Self {
        PromptConfirm { input, assume_yes }
    }
}

impl<R: BufRead> Confirm for PromptConfirm<R> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/n] ", prompt);
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if self.input.read_line(&mut answer).is_err() {
            return false;
        }
        answer.trim().eq_ignore_ascii_case("y")
    }
}

/// Pre-scripted answers; records every prompt shown.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    pub prompts: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        ScriptedConfirm {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}
