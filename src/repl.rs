// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive REPL (Read-Eval-Print Loop) for the Tamarin language.
//!
//! Every line is compiled against the definitions of the lines before it,
//! so `let` bindings and functions carry over for the whole session.

use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tamarin_core::{Engine, Value};

/// REPL configuration constants
const HISTORY_FILE: &str = ".tamarin_history";
const MAX_HISTORY_SIZE: usize = 1000;

const KEYWORDS: &[&str] = &["fn", "let", "if", "else", "return"];
const LITERALS: &[&str] = &["true", "false"];

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Version,
    Load,
    Bytecode,
}

impl ReplCommand {
    /// Parse a REPL command from input string
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let rest = input.trim().strip_prefix('.')?;

        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next()?.to_lowercase();
        let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

        match cmd.as_str() {
            "help" | "h" | "?" => Some((ReplCommand::Help, arg)),
            "exit" | "quit" | "q" => Some((ReplCommand::Exit, arg)),
            "clear" | "cls" => Some((ReplCommand::Clear, arg)),
            "version" | "v" => Some((ReplCommand::Version, arg)),
            "load" | "l" => Some((ReplCommand::Load, arg)),
            "bytecode" | "bc" => Some((ReplCommand::Bytecode, arg)),
            _ => None,
        }
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".version", "Show version information"),
            (".load <file>", "Load and execute a Tamarin file"),
            (".bytecode <code>", "Show the compiled bytecode for code"),
        ]
    }
}

/// Helper struct for rustyline that provides completion, hints, and validation
#[derive(Default)]
struct TamarinHelper {
    /// Keywords, builtins and commands for completion
    words: Vec<String>,
    /// Builtin names, highlighted separately
    builtins: Vec<String>,
}

impl TamarinHelper {
    fn new(engine: &Engine) -> Self {
        let builtins: Vec<String> = engine.builtins().names().map(String::from).collect();

        let mut words: Vec<String> = KEYWORDS
            .iter()
            .chain(LITERALS)
            .map(|word| word.to_string())
            .collect();
        words.extend(builtins.iter().cloned());
        words.extend(
            ReplCommand::all_commands()
                .iter()
                .filter_map(|(cmd, _)| cmd.split_whitespace().next())
                .map(String::from),
        );

        Self { words, builtins }
    }

    fn highlight_word(&self, word: &str) -> String {
        if KEYWORDS.contains(&word) {
            word.magenta().bold().to_string()
        } else if LITERALS.contains(&word) {
            word.blue().to_string()
        } else if self.builtins.iter().any(|name| name == word) {
            word.cyan().to_string()
        } else if word.chars().all(|c| c.is_ascii_digit()) {
            word.yellow().to_string()
        } else {
            word.to_string()
        }
    }
}

/// Byte offset where the word ending at `pos` starts
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '.')
        .map(|i| i + 1)
        .unwrap_or(0)
}

impl Completer for TamarinHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[word_start(line, pos)..pos];
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let matches: Vec<Pair> = self
            .words
            .iter()
            .filter(|candidate| candidate.starts_with(word))
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate[word.len()..].to_string(),
            })
            .collect();

        Ok((pos, matches))
    }
}

impl Hinter for TamarinHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }

        let word = &line[word_start(line, pos)..];
        if word.len() < 2 {
            return None;
        }

        self.words
            .iter()
            .find(|candidate| candidate.starts_with(word) && candidate.len() > word.len())
            .map(|candidate| candidate[word.len()..].to_string().dimmed().to_string())
    }
}

impl Highlighter for TamarinHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let mut result = String::with_capacity(line.len() * 2);
        let mut current_word = String::new();
        let mut in_string = false;

        for c in line.chars() {
            if in_string {
                result.push_str(&c.green().to_string());
                if c == '"' {
                    in_string = false;
                }
                continue;
            }

            if c.is_alphanumeric() || c == '_' {
                current_word.push(c);
                continue;
            }

            if !current_word.is_empty() {
                result.push_str(&self.highlight_word(&current_word));
                current_word.clear();
            }

            let colored = match c {
                '(' | ')' | '[' | ']' | '{' | '}' => c.yellow().to_string(),
                '+' | '-' | '*' | '/' | '=' | '<' | '>' | '!' => c.cyan().to_string(),
                '"' => {
                    in_string = true;
                    c.green().to_string()
                }
                '.' if line.starts_with('.') => c.magenta().to_string(),
                _ => c.to_string(),
            };
            result.push_str(&colored);
        }

        if !current_word.is_empty() {
            result.push_str(&self.highlight_word(&current_word));
        }

        Cow::Owned(result)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Validator for TamarinHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();

        if input.trim_start().starts_with('.') {
            return Ok(ValidationResult::Valid(None));
        }

        if !is_balanced(input) {
            return Ok(ValidationResult::Incomplete);
        }

        // A trailing operator expects more input
        let trimmed = input.trim_end();
        if trimmed.ends_with(['+', '-', '*', '/', '=', ',', ':']) {
            return Ok(ValidationResult::Incomplete);
        }

        Ok(ValidationResult::Valid(None))
    }
}

/// Check if brackets, braces, and parentheses are balanced
fn is_balanced(input: &str) -> bool {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut in_comment = false;
    let mut escape_next = false;
    let mut prev = '\0';

    for c in input.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            prev = c;
            continue;
        }

        if escape_next {
            escape_next = false;
            prev = c;
            continue;
        }

        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            prev = c;
            continue;
        }

        match c {
            '"' => in_string = true,
            '/' if prev == '/' => in_comment = true,
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ')' | ']' | '}' => {
                if stack.pop() != Some(c) {
                    // Let the parser report the stray delimiter
                    return true;
                }
            }
            _ => {}
        }
        prev = c;
    }

    stack.is_empty() && !in_string
}

impl Helper for TamarinHelper {}

/// The interactive REPL for the Tamarin language
pub struct Repl {
    engine: Engine,
    editor: Editor<TamarinHelper, DefaultHistory>,
    history_path: PathBuf,
}

impl Repl {
    /// Create a new REPL instance around `engine`
    pub fn new(engine: Engine) -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(TamarinHelper::new(&engine)));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tamarin")
            .join(HISTORY_FILE);

        if let Some(parent) = history_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::debug!(path = %parent.display(), error = %e, "cannot create history directory");
            }
        }

        // Missing history is normal on first start
        let _ = editor.load_history(&history_path);

        Ok(Self {
            engine,
            editor,
            history_path,
        })
    }

    /// Run the REPL main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            match self.editor.readline(&format_prompt()) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some((cmd, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }

                    if trimmed.starts_with('.') {
                        eprintln!(
                            "{}: unknown command '{}', try {}",
                            "Error".red().bold(),
                            trimmed.cyan(),
                            ".help".cyan()
                        );
                        continue;
                    }

                    self.eval_and_print(trimmed);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        if let Err(e) = self.editor.save_history(&self.history_path) {
            tracing::warn!(path = %self.history_path.display(), error = %e, "failed to save history");
        }

        self.print_goodbye();
        Ok(())
    }

    fn print_banner(&self) {
        let version = env!("CARGO_PKG_VERSION");
        println!();
        for line in [
            r#"  _                            _       "#,
            r#" | |_ __ _ _ __ ___   __ _ _ _(_)_ __  "#,
            r#" |  _/ _` | '  \ / _` | '_| | ' \ "#,
            r#"  \__\__,_|_|_|_\__,_|_| |_|_||_|"#,
        ] {
            println!("{}", line.bright_cyan().bold());
        }
        println!();
        println!(
            "  {} {} {}",
            "Tamarin".white().bold(),
            "v".dimmed(),
            version.bright_yellow()
        );
        println!("  {}", "Bytecode compiler and virtual machine".dimmed());
        println!();
        println!(
            "  {} {} {}",
            "Type".dimmed(),
            ".help".cyan(),
            "for available commands".dimmed()
        );
        println!();
    }

    fn print_goodbye(&self) {
        println!();
        println!("{}", "Goodbye!".bright_cyan());
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Help => self.print_help(),
            ReplCommand::Exit => return CommandResult::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Version => self.print_version(),
            ReplCommand::Load => match arg {
                Some(path) => self.load_file(Path::new(path)),
                None => print_missing_argument(".load", "a file path"),
            },
            ReplCommand::Bytecode => match arg {
                Some(code) => self.print_bytecode(code),
                None => print_missing_argument(".bytecode", "some code"),
            },
        }
        CommandResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "REPL Commands:".white().bold());
        println!();

        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:18} {}", cmd.cyan(), desc.dimmed());
        }

        println!();
        println!("{}", "Keyboard Shortcuts:".white().bold());
        println!();
        println!("  {:18} {}", "Ctrl+C".yellow(), "Cancel current input".dimmed());
        println!("  {:18} {}", "Ctrl+D".yellow(), "Exit REPL".dimmed());
        println!("  {:18} {}", "Tab".yellow(), "Autocomplete".dimmed());
        println!("  {:18} {}", "↑/↓".yellow(), "Navigate history".dimmed());
        println!();
    }

    fn print_version(&self) {
        let config = self.engine.config();
        println!();
        println!("{}: {}", "Tamarin".bright_cyan().bold(), env!("CARGO_PKG_VERSION").yellow());
        println!(
            "{}: stack {}, frames {}, globals {}",
            "Limits".dimmed(),
            config.stack_size,
            config.max_frames,
            config.globals_size
        );
        println!();
    }

    fn load_file(&mut self, path: &Path) {
        match self.engine.eval_file(path) {
            Ok(value) => print_value(value.as_ref()),
            Err(e) => print_error(&e),
        }
    }

    fn print_bytecode(&self, code: &str) {
        match self.engine.compile(code) {
            Ok(bytecode) => print!("{}", bytecode),
            Err(e) => print_error(&e),
        }
    }

    fn eval_and_print(&mut self, input: &str) {
        match self.engine.eval(input) {
            Ok(value) => print_value(value.as_ref()),
            Err(e) => print_error(&e),
        }
    }
}

/// Result of executing a REPL command
enum CommandResult {
    Continue,
    Exit,
}

fn format_prompt() -> String {
    format!("{} ", "tamarin>".bright_green().bold())
}

fn print_value(value: Option<&Value>) {
    if let Some(value) = value {
        println!("{}", format_value(value));
    }
}

/// Format a value for display with syntax coloring
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".blue().to_string(),
        Value::Boolean(b) => b.yellow().to_string(),
        Value::Integer(n) => n.yellow().to_string(),
        Value::String(s) => format!("\"{}\"", s).green().to_string(),
        Value::Error(_) => value.red().to_string(),
        Value::Function(_) | Value::Closure(_) | Value::Builtin(_) => value.magenta().to_string(),
        Value::Array(_) | Value::Hash(_) | Value::Return(_) => value.to_string(),
    }
}

fn print_missing_argument(command: &str, what: &str) {
    eprintln!(
        "{}: {} {}",
        "Error".red().bold(),
        command.cyan(),
        format!("requires {}", what).dimmed()
    );
}

/// Print a formatted error message
fn print_error(error: &tamarin_core::Error) {
    let error_str = error.to_string();

    // Split error kind from message
    if let Some(colon_pos) = error_str.find(':') {
        let (error_type, message) = error_str.split_at(colon_pos);
        eprintln!("{}{}", error_type.red().bold(), message);
    } else {
        eprintln!("{}", error_str.red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_command_parse() {
        assert!(matches!(
            ReplCommand::parse(".help"),
            Some((ReplCommand::Help, None))
        ));
        assert!(matches!(
            ReplCommand::parse(".exit"),
            Some((ReplCommand::Exit, None))
        ));
        assert!(matches!(
            ReplCommand::parse(".load test.tam"),
            Some((ReplCommand::Load, Some("test.tam")))
        ));
        assert!(matches!(
            ReplCommand::parse(".bytecode 1 + 2"),
            Some((ReplCommand::Bytecode, Some("1 + 2")))
        ));
        assert!(ReplCommand::parse(".nope").is_none());
        assert!(ReplCommand::parse("not a command").is_none());
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("(1 + 2)"));
        assert!(is_balanced(r#"{"a": 1}"#));
        assert!(is_balanced("fn(x) { return x; }"));
        assert!(!is_balanced("(1 + 2"));
        assert!(!is_balanced("fn(x) { x"));
        assert!(is_balanced(r#""string with (unbalanced""#));
        assert!(is_balanced("1 // comment with {"));
        assert!(!is_balanced(r#""unterminated"#));
    }

    #[test]
    fn test_hint_completes_partial_keyword() {
        let helper = TamarinHelper::new(&Engine::new());
        let history = DefaultHistory::new();
        let ctx = rustyline::Context::new(&history);

        assert_eq!(helper.hint("le", 2, &ctx), Some("t".dimmed().to_string()));
        assert_eq!(helper.hint("pu", 2, &ctx), Some("sh".dimmed().to_string()));
        assert_eq!(helper.hint("l", 1, &ctx), None);
        assert_eq!(helper.hint("let", 1, &ctx), None);
    }

    #[test]
    fn test_completion_words() {
        let helper = TamarinHelper::new(&Engine::new());
        assert!(helper.words.iter().any(|w| w == "let"));
        assert!(helper.words.iter().any(|w| w == "puts"));
        assert!(helper.words.iter().any(|w| w == ".bytecode"));
        assert_eq!(word_start("let x = pu", 10), 8);
    }
}
