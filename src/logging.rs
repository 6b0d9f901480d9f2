use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;

use chrono::Local;
use serde_json::{json, Map, Value as JsonValue};

use crate::value::Value;

/// Verbosity, ordered from quietest to loudest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Off => "OFF",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    pub fn parse_level(s: &str) -> Option<LogLevel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Some(LogLevel::Off),
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<LogFormat> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }
}

/// A default level plus per-target overrides. The longest matching target
/// prefix wins.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFilter {
    pub default: LogLevel,
    pub rules: Vec<(String, LogLevel)>,
}

impl LogFilter {
    pub fn new(default: LogLevel) -> Self {
        LogFilter {
            default,
            rules: Vec::new(),
        }
    }

    pub fn level_for_target(&self, target: &str) -> LogLevel {
        let mut best: Option<(usize, LogLevel)> = None;
        for (rule_target, level) in &self.rules {
            if rule_target.is_empty() {
                continue;
            }
            if target.starts_with(rule_target.as_str()) {
                let len = rule_target.len();
                if best.map(|(best_len, _)| len > best_len).unwrap_or(true) {
                    best = Some((len, *level));
                }
            }
        }
        best.map(|(_, level)| level).unwrap_or(self.default)
    }

    pub fn enabled(&self, level: LogLevel, target: &str) -> bool {
        level != LogLevel::Off && level <= self.level_for_target(target)
    }
}

impl Default for LogFilter {
    fn default() -> Self {
        LogFilter::new(LogLevel::Warn)
    }
}

/// Parse `warn,pyrt::object=trace` style filter strings.
pub fn parse_filter(spec: &str) -> Result<LogFilter, String> {
    let mut default = None;
    let mut rules = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((target, level_str)) = part.split_once('=') {
            let level = LogLevel::parse_level(level_str)
                .ok_or_else(|| format!("Invalid log level '{}'", level_str.trim()))?;
            rules.push((target.trim().to_string(), level));
        } else {
            let level =
                LogLevel::parse_level(part).ok_or_else(|| format!("Invalid log level '{}'", part))?;
            default = Some(level);
        }
    }

    Ok(LogFilter {
        default: default.unwrap_or(LogLevel::Warn),
        rules,
    })
}

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub target: String,
    /// Hosted program the record was emitted from, if any
    pub source: Option<String>,
    pub fields: Vec<(String, Value)>,
}

impl LogRecord {
    pub fn new(level: LogLevel, target: &str, message: impl Into<String>) -> Self {
        LogRecord {
            level,
            message: message.into(),
            target: target.to_string(),
            source: None,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.push((key.to_string(), value));
        self
    }
}

#[derive(Debug)]
pub enum LogSink {
    Stderr,
    File {
        path: String,
        append: bool,
        file: Option<std::fs::File>,
    },
    Memory {
        entries: Vec<String>,
        max: usize,
    },
}

impl LogSink {
    pub fn memory(max: usize) -> Self {
        LogSink::Memory {
            entries: Vec::new(),
            max,
        }
    }
}

#[derive(Debug)]
pub struct LoggerCore {
    pub filter: LogFilter,
    pub format: LogFormat,
    pub timestamps: bool,
    pub sinks: Vec<LogSink>,
}

impl LoggerCore {
    pub fn new() -> Self {
        LoggerCore {
            filter: LogFilter::default(),
            format: LogFormat::Text,
            timestamps: true,
            sinks: vec![LogSink::Stderr],
        }
    }

    pub fn enabled(&self, level: LogLevel, target: &str) -> bool {
        self.filter.enabled(level, target)
    }

    pub fn log(&mut self, record: &LogRecord) {
        if !self.enabled(record.level, &record.target) {
            return;
        }
        let formatted = self.format_record(record);
        for sink in &mut self.sinks {
            match sink {
                LogSink::Stderr => {
                    eprintln!("{}", formatted);
                }
                LogSink::File { path, append, file } => {
                    if file.is_none() {
                        let mut opts = OpenOptions::new();
                        opts.create(true).write(true);
                        if *append {
                            opts.append(true);
                        } else {
                            opts.truncate(true);
                        }
                        match opts.open(path.as_str()) {
                            Ok(handle) => {
                                *file = Some(handle);
                            }
                            Err(err) => {
                                eprintln!("Warning: could not open log file '{}': {}", path, err);
                            }
                        }
                    }
                    if let Some(handle) = file {
                        let _ = writeln!(handle, "{}", formatted);
                    }
                }
                LogSink::Memory { entries, max } => {
                    entries.push(formatted.clone());
                    if entries.len() > *max {
                        let drain = entries.len() - *max;
                        entries.drain(0..drain);
                    }
                }
            }
        }
    }

    /// Lines captured by every memory sink, oldest first
    pub fn memory_entries(&self) -> Vec<String> {
        self.sinks
            .iter()
            .filter_map(|sink| match sink {
                LogSink::Memory { entries, .. } => Some(entries.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn format_record(&self, record: &LogRecord) -> String {
        match self.format {
            LogFormat::Json => self.format_json(record),
            LogFormat::Compact => format_compact(record),
            LogFormat::Text => self.format_text(record),
        }
    }

    fn format_text(&self, record: &LogRecord) -> String {
        let mut parts = Vec::new();
        parts.push(format!("[{:5}]", record.level.name()));
        if self.timestamps {
            parts.push(timestamp_string());
        }
        if !record.target.is_empty() {
            parts.push(record.target.clone());
        }
        if let Some(source) = &record.source {
            parts.push(format!("<{}>", source));
        }

        let mut msg = record.message.clone();
        if !record.fields.is_empty() {
            msg = format!("{} {}", msg, format_fields(&record.fields));
        }

        format!("{} | {}", parts.join(" "), msg)
    }

    fn format_json(&self, record: &LogRecord) -> String {
        let mut obj = Map::new();
        if self.timestamps {
            obj.insert("ts".to_string(), JsonValue::String(timestamp_string()));
        }
        obj.insert(
            "level".to_string(),
            JsonValue::String(record.level.name().to_string()),
        );
        obj.insert(
            "target".to_string(),
            JsonValue::String(record.target.clone()),
        );
        if let Some(source) = &record.source {
            obj.insert("program".to_string(), JsonValue::String(source.clone()));
        }
        obj.insert("msg".to_string(), JsonValue::String(record.message.clone()));

        let mut fields = Map::new();
        for (k, v) in &record.fields {
            fields.insert(k.clone(), value_to_json(v));
        }
        obj.insert("fields".to_string(), JsonValue::Object(fields));

        JsonValue::Object(obj).to_string()
    }
}

impl Default for LoggerCore {
    fn default() -> Self {
        Self::new()
    }
}

fn format_compact(record: &LogRecord) -> String {
    let mut msg = record.message.clone();
    if !record.fields.is_empty() {
        msg = format!("{} {}", msg, format_fields(&record.fields));
    }
    format!("[{}] {}", record.level.name(), msg)
}

fn format_fields(fields: &[(String, Value)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, crate::formatter::repr(v)))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::None => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(n) => match i64::try_from(n) {
            Ok(small) => json!(small),
            Err(_) => JsonValue::String(n.to_string()),
        },
        Value::Float(f) => json!(f),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Tuple(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
        Value::List(list) => JsonValue::Array(list.borrow().iter().map(value_to_json).collect()),
        other => JsonValue::String(crate::formatter::repr(other)),
    }
}

pub fn timestamp_string() -> String {
    format!("{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
}
