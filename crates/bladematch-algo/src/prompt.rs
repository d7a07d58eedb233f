use crate::error::{MatchError, Result};
use crate::presets::InitTemplate;
use std::io::{BufRead, Write};

/// Blocking user decisions taken during a case.
pub trait Prompt {
    fn choose_template(&mut self) -> Result<InitTemplate>;
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
pub struct StdinPrompt;

impl StdinPrompt {
    fn ask(&self, question: &str) -> Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{question}").map_err(|e| MatchError::io("<stdout>", e))?;
        stdout.flush().map_err(|e| MatchError::io("<stdout>", e))?;
        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| MatchError::io("<stdin>", e))?;
        if read == 0 {
            return Err(MatchError::InvalidState("stdin closed while waiting for an answer".to_string()));
        }
        Ok(line.trim().to_string())
    }
}

impl Prompt for StdinPrompt {
    fn choose_template(&mut self) -> Result<InitTemplate> {
        loop {
            let answer = self.ask(
                "\nChoose blade type:\n\t0 for compressor\n\t1 for turbine\n\tor a path to a .cfg file\n\nSelected type:\t",
            )?;
            match answer.parse() {
                Ok(template) => return Ok(template),
                Err(e) => println!("{e}"),
            }
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} [y/N] "))?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

/// Answers every question the same way. Records what was asked.
#[derive(Debug, Clone)]
pub struct FixedPrompt {
    pub template: InitTemplate,
    pub answer: bool,
    pub asked: Vec<String>,
}

impl FixedPrompt {
    pub fn new(template: InitTemplate, answer: bool) -> Self {
        Self {
            template,
            answer,
            asked: Vec::new(),
        }
    }
}

impl Prompt for FixedPrompt {
    fn choose_template(&mut self) -> Result<InitTemplate> {
        self.asked.push("template".to_string());
        Ok(self.template.clone())
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.asked.push(question.to_string());
        Ok(self.answer)
    }
}
