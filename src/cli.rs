//! Cli processor for fsv binary

use crate::common::{Encoding, FsvResult};
use crate::error::FsvError;
use crate::escaper::Escaper;
use crate::logger::{Logger, WriteOption};
use crate::restorer::Restorer;
use crate::scan::{ChatMessage, EventScanner};
use crate::settings::{load_settings, JsonFileStore, Settings, SettingsStore};
use clap::ArgAction;
use serde_json::Value;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Struct to parse command line arguments and execute proper operations
pub struct FsvCli {
    write_to_file: Option<PathBuf>,
    settings_file: Option<PathBuf>,
    logger: Logger,
}

impl Default for FsvCli {
    fn default() -> Self {
        Self::new()
    }
}

impl FsvCli {
    /// Create a new instance
    pub fn new() -> Self {
        Self {
            write_to_file: None,
            settings_file: None,
            logger: Logger::new(),
        }
    }

    /// Print an error through cli's logger
    pub fn print_error(&self, error: &str) {
        self.logger.elog(error);
    }

    /// User method to call cli workflow
    ///
    /// This sequentially parse command line arguments and execute necessary operations
    pub fn parse(&mut self) -> FsvResult<()> {
        let cli_args = Self::args_builder(None);
        self.run(&cli_args)
    }

    /// Parse arguments from string
    pub fn parse_from(&mut self, source: &[&str]) -> FsvResult<()> {
        let cli_args = Self::args_builder(Some(source));
        self.run(&cli_args)
    }

    fn run(&mut self, args: &clap::ArgMatches) -> FsvResult<()> {
        self.parse_options(args);

        if args.get_flag("silent") {
            self.logger.set_write_option(WriteOption::Discard);
        }

        let settings = self.build_settings(args)?;
        self.logger.set_debug(settings.debug);

        // -->> Chat file
        if let Some(chat) = args.get_one::<String>("chat") {
            return self.scan_chat_file(Path::new(chat), &settings);
        }

        let encoding = Encoding::from_str(
            args.get_one::<String>("encoding")
                .map(|s| s.as_str())
                .unwrap_or("marker"),
        )?;
        let restore = args.get_flag("restore");

        // -->> Read from given sources, or stdin if none
        let mut output = String::new();
        if let Some(sources) = args.get_many::<String>("INPUT") {
            let literal = args.get_flag("literal");
            for src in sources {
                let text = if literal {
                    src.to_string()
                } else {
                    let path = Path::new(src);
                    if !path.exists() {
                        return Err(FsvError::InvalidFile(format!("{}", path.display())));
                    }
                    std::fs::read_to_string(path)?
                };
                output.push_str(&self.transform(&text, encoding, restore, &settings));
            }
        } else {
            let mut input = String::new();
            std::io::stdin().lock().read_to_string(&mut input)?;
            output.push_str(&self.transform(&input, encoding, restore, &settings));
        }

        self.write_output(&output)
    }

    fn transform(&self, text: &str, encoding: Encoding, restore: bool, settings: &Settings) -> String {
        if restore {
            Restorer::new(encoding)
                .restore(text, settings, &self.logger)
                .into_owned()
        } else {
            Escaper::new(encoding)
                .escape(text, settings, &self.logger)
                .into_owned()
        }
    }

    /// Run a single scan over a jsonl chat file
    ///
    /// Unchanged lines are written back verbatim. Changed ones only get their text fields
    /// replaced, with key order and line ending of the original line.
    fn scan_chat_file(&self, path: &Path, settings: &Settings) -> FsvResult<()> {
        if !path.exists() {
            return Err(FsvError::InvalidFile(format!("{}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        // (line, terminator) pairs
        let lines = content
            .split_inclusive('\n')
            .map(|raw| {
                let line = raw.trim_end_matches(|c| c == '\r' || c == '\n');
                (line, &raw[line.len()..])
            })
            .collect::<Vec<_>>();

        let mut chat = Vec::with_capacity(lines.len());
        for (index, (line, _)) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                chat.push(ChatMessage::default());
                continue;
            }
            let message = serde_json::from_str::<ChatMessage>(line)
                .map_err(|err| FsvError::InvalidChat(index + 1, err.to_string()))?;
            chat.push(message);
        }

        let report = EventScanner::new().scan_chat(&mut chat, settings, &self.logger);
        self.logger.log(&format!(
            "Scanned {} message(s), fixed {} field(s)",
            report.messages, report.fields
        ));

        let mut output = String::with_capacity(content.len());
        for (index, (line, ending)) in lines.iter().enumerate() {
            if report.changed.contains(&index) {
                output.push_str(&Self::patch_record(line, &chat[index])?);
            } else {
                output.push_str(line);
            }
            output.push_str(ending);
        }

        match &self.write_to_file {
            Some(_) => self.write_output(&output),
            None => {
                // Rewrite in place only when something changed
                if !report.changed.is_empty() {
                    std::fs::write(path, output)?;
                }
                Ok(())
            }
        }
    }

    /// Write fixed text fields back into the raw record
    fn patch_record(line: &str, message: &ChatMessage) -> FsvResult<String> {
        let mut record = serde_json::from_str::<Value>(line)?;
        if let Some(object) = record.as_object_mut() {
            if let Some(mes) = &message.mes {
                object.insert("mes".to_string(), Value::from(mes.as_str()));
            }
            if let Some(swipes) = &message.swipes {
                object.insert("swipes".to_string(), Value::from(swipes.clone()));
            }
        }
        Ok(serde_json::to_string(&record)?)
    }

    fn write_output(&self, output: &str) -> FsvResult<()> {
        match &self.write_to_file {
            Some(file) => std::fs::write(file, output)?,
            None => write!(std::io::stdout(), "{}", output)?,
        }
        Ok(())
    }

    /// Settings from file first, flags override
    fn build_settings(&self, args: &clap::ArgMatches) -> FsvResult<Settings> {
        let mut settings = match &self.settings_file {
            Some(file) => {
                let store = JsonFileStore::new(file);
                // A broken file is an error when it is about to be overwritten
                if args.get_flag("save") {
                    store.load()?;
                }
                load_settings(&store, &self.logger)
            }
            None => Settings::default(),
        };
        if args.get_flag("disable") {
            settings.enabled = false;
        }
        if args.get_flag("debug") {
            settings.debug = true;
        }
        if args.get_flag("save") {
            match &self.settings_file {
                Some(file) => JsonFileStore::new(file).save(&settings)?,
                None => {
                    return Err(FsvError::InvalidCommandOption(
                        "Save option needs a settings file".to_string(),
                    ))
                }
            }
        }
        Ok(settings)
    }

    /// Parse processor options
    fn parse_options(&mut self, args: &clap::ArgMatches) {
        // Write to file
        self.write_to_file = args.get_one::<String>("out").map(PathBuf::from);

        // Settings file
        self.settings_file = args.get_one::<String>("settings").map(PathBuf::from);
    }

    /// Create argument requirements
    fn args_builder(source: Option<&[&str]>) -> clap::ArgMatches {
        use clap::{Arg, Command};
        let app = Command::new("fsv")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Fsv escapes pipes inside setvar style macro calls so macro engines don't split variable values.")
            .override_usage("fsv <FILE> -o <OUT_FILE>
    echo <STDIN_TEXT> | fsv --encoding backslash
    echo <STDIN_TEXT> | fsv --restore
    fsv --chat <CHAT.jsonl> --settings <SETTINGS.json>")
            .arg(Arg::new("INPUT")
                .num_args(0..)
                .help("INPUT source to execute processing"))
            .arg(Arg::new("literal")
                .short('L')
                .long("literal")
                .action(ArgAction::SetTrue)
                .help("Don't interpret input source as file"))
            .arg(Arg::new("restore")
                .short('r')
                .long("restore")
                .action(ArgAction::SetTrue)
                .help("Restore pipes instead of escaping them"))
            .arg(Arg::new("encoding")
                .long("encoding")
                .action(ArgAction::Set)
                .value_name("ENCODING")
                .default_value("marker")
                .help("Pipe encoding (backslash|marker)"))
            .arg(Arg::new("chat")
                .long("chat")
                .action(ArgAction::Set)
                .value_name("FILE")
                .conflicts_with_all(["INPUT", "restore", "literal"])
                .help("Fix every message of a jsonl chat file in place"))
            .arg(Arg::new("out")
                .short('o')
                .long("out")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("Save processed output to the file"))
            .arg(Arg::new("settings")
                .long("settings")
                .action(ArgAction::Set)
                .value_name("FILE")
                .help("Read flags from a json settings file"))
            .arg(Arg::new("save")
                .long("save")
                .action(ArgAction::SetTrue)
                .help("Write resulting flags back into the settings file"))
            .arg(Arg::new("disable")
                .long("disable")
                .action(ArgAction::SetTrue)
                .help("Disable the filter, inputs pass through untouched"))
            .arg(Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Print debug diagnostics"))
            .arg(Arg::new("silent")
                .short('s')
                .long("silent")
                .action(ArgAction::SetTrue)
                .conflicts_with("debug")
                .help("Suppress every log"));

        if let Some(src) = source {
            app.get_matches_from(src)
        } else {
            app.get_matches()
        }
    }
}
