//! Line-oriented operator console over an in-process engine.
//!
//! Each line is one command. The acting identity is console state (`as
//! <actor>`), standing in for the caller identity a host environment would
//! supply. Engine rejections are ordinary results and are printed, not raised.

pub mod outputformatter;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::ident::{ActorId, Category, Handle, Summary, Title};
use crate::model::{AccessGrant, ActivityEvent, Checksum, Entity, Record, RecordContent, Tier};
use crate::storage::MemoryStore;
use outputformatter::{json_output_requested, render_table, terminal_width, Tabular};

pub const HELP: &str = "\
Commands:
  as <actor>                                   act as <actor> from now on
  whoami                                       show the acting identity
  register <handle> <title..>                  register an entity
  deposit <entity> <record> <checksum> <category> <title> [summary]
  revise  <entity> <record> <checksum> <category> <title> [summary]
  grant   <entity> <record> <actor> <tier>     tier: 0-4 or BLOCKED..PRINCIPAL
  revoke  <entity> <record> <actor>
  retrieve <entity> <record>                   log read intent
  purge   <entity> <record>
  entity  <handle>
  record  <entity> <record>
  records <entity>
  tier    <entity> <record> <actor>
  event   <entity> <record> <sequence>
  history <entity> <record>
  grants  <entity> <record>
  save                                         write a snapshot now
  help | quit | exit
Quote arguments containing spaces: \"like this\". Lines starting with # are ignored.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub entity: Handle,
    pub record: Handle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    As(ActorId),
    WhoAmI,
    Register { handle: Handle, title: Title },
    Deposit { target: Target, content: RecordContent },
    Revise { target: Target, content: RecordContent },
    Grant { target: Target, actor: ActorId, level: u8 },
    Revoke { target: Target, actor: ActorId },
    Retrieve(Target),
    Purge(Target),
    Entity(Handle),
    Record(Target),
    Records(Handle),
    Tier { target: Target, actor: ActorId },
    Event { target: Target, sequence: u64 },
    History(Target),
    Grants(Target),
    Save,
    Help,
    Quit,
}

/// Split a line on whitespace, keeping double-quoted runs together.
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut had_token = false;
    for ch in line.chars() {
        match ch {
            '"' => { in_quotes = !in_quotes; had_token = true; }
            c if c.is_whitespace() && !in_quotes => {
                if had_token { out.push(std::mem::take(&mut cur)); had_token = false; }
            }
            c => { cur.push(c); had_token = true; }
        }
    }
    if in_quotes { bail!("unterminated quote"); }
    if had_token { out.push(cur); }
    Ok(out)
}

fn arg<'a>(args: &'a [String], i: usize, name: &str) -> Result<&'a str> {
    args.get(i).map(String::as_str).ok_or_else(|| anyhow!("missing <{}>", name))
}

fn handle(args: &[String], i: usize, name: &str) -> Result<Handle> {
    Ok(Handle::new(arg(args, i, name)?).with_context(|| format!("invalid <{name}>"))?)
}

fn target(args: &[String]) -> Result<Target> {
    Ok(Target { entity: handle(args, 0, "entity")?, record: handle(args, 1, "record")? })
}

fn content(args: &[String]) -> Result<RecordContent> {
    let checksum: Checksum = arg(args, 2, "checksum")?.parse().context("invalid <checksum>")?;
    let category = Category::new(arg(args, 3, "category")?).context("invalid <category>")?;
    let title = Title::new(arg(args, 4, "title")?).context("invalid <title>")?;
    let summary = Summary::new(args.get(5..).map(|s| s.join(" ")).unwrap_or_default()).context("invalid [summary]")?;
    Ok(RecordContent { title, summary, checksum, category })
}

/// Tier argument as a raw level. Out-of-range numbers pass through so the
/// engine can reject them the way it rejects any ungrantable level.
fn level(raw: &str) -> Result<u8> {
    if let Ok(n) = raw.parse::<u8>() { return Ok(n); }
    Ok(raw.parse::<Tier>()?.level())
}

/// Parse one console line. `Ok(None)` for blank lines and comments.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') { return Ok(None); }
    let tokens = tokenize(line)?;
    let Some((verb, args)) = tokens.split_first() else { return Ok(None); };
    let cmd = match verb.to_ascii_lowercase().as_str() {
        "as" => Command::As(ActorId::from(arg(args, 0, "actor")?)),
        "whoami" => Command::WhoAmI,
        "register" => {
            let handle = handle(args, 0, "handle")?;
            let title = Title::new(args.get(1..).map(|s| s.join(" ")).unwrap_or_default()).context("invalid <title>")?;
            Command::Register { handle, title }
        }
        "deposit" => Command::Deposit { target: target(args)?, content: content(args)? },
        "revise" => Command::Revise { target: target(args)?, content: content(args)? },
        "grant" => Command::Grant {
            target: target(args)?,
            actor: ActorId::from(arg(args, 2, "actor")?),
            level: level(arg(args, 3, "tier")?)?,
        },
        "revoke" => Command::Revoke { target: target(args)?, actor: ActorId::from(arg(args, 2, "actor")?) },
        "retrieve" => Command::Retrieve(target(args)?),
        "purge" => Command::Purge(target(args)?),
        "entity" => Command::Entity(handle(args, 0, "handle")?),
        "record" => Command::Record(target(args)?),
        "records" => Command::Records(handle(args, 0, "entity")?),
        "tier" => Command::Tier { target: target(args)?, actor: ActorId::from(arg(args, 2, "actor")?) },
        "event" => Command::Event {
            target: target(args)?,
            sequence: arg(args, 2, "sequence")?.parse().context("invalid <sequence>")?,
        },
        "history" => Command::History(target(args)?),
        "grants" => Command::Grants(target(args)?),
        "save" => Command::Save,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{}'; type 'help'", other),
    };
    Ok(Some(cmd))
}

/// Result of one console command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ok(String),
    /// The line did not parse into a command.
    Invalid(String),
    Rejected(EngineError),
    Entities(Vec<Entity>),
    Records(Vec<Record>),
    Grants(Vec<AccessGrant>),
    Events(Vec<ActivityEvent>),
    Tier { actor: ActorId, tier: Tier },
    Help,
    Quit,
}

impl Outcome {
    fn from_result<T>(res: Result<T, EngineError>, done: impl FnOnce(T) -> String) -> Self {
        match res {
            Ok(value) => Outcome::Ok(done(value)),
            Err(e) => Outcome::Rejected(e),
        }
    }

    /// Text lines for display, tables sized to `width`.
    pub fn render(&self, width: usize, json: bool) -> Vec<String> {
        fn rows<T: Tabular + Serialize>(items: &[T], width: usize, json: bool) -> Vec<String> {
            if json {
                return vec![serde_json::to_string_pretty(items).unwrap_or_else(|e| format!("error: {e}"))];
            }
            if items.is_empty() { return vec!["no rows".to_string()]; }
            render_table(items, width)
        }
        match self {
            Outcome::Ok(msg) => vec![format!("ok: {msg}")],
            Outcome::Invalid(msg) => vec![format!("error: {msg}")],
            Outcome::Rejected(e) if e.is_read_path() => vec![format!("read rejected: {} ({})", e.code_str(), e)],
            Outcome::Rejected(e) => vec![format!("rejected: {} ({})", e.code_str(), e)],
            Outcome::Entities(v) => rows(v, width, json),
            Outcome::Records(v) => rows(v, width, json),
            Outcome::Grants(v) => rows(v, width, json),
            Outcome::Events(v) => rows(v, width, json),
            Outcome::Tier { actor, tier } => vec![format!("{actor}: {tier} ({})", tier.level())],
            Outcome::Help => HELP.lines().map(str::to_string).collect(),
            Outcome::Quit => Vec::new(),
        }
    }
}

pub struct Console<C: Clock> {
    engine: Engine<MemoryStore, C>,
    actor: ActorId,
    snapshot_path: Option<PathBuf>,
}

impl<C: Clock> Console<C> {
    pub fn new(engine: Engine<MemoryStore, C>, actor: ActorId, snapshot_path: Option<PathBuf>) -> Self {
        Self { engine, actor, snapshot_path }
    }

    pub fn engine(&self) -> &Engine<MemoryStore, C> { &self.engine }
    pub fn actor(&self) -> &ActorId { &self.actor }

    pub fn execute(&mut self, cmd: Command) -> Result<Outcome> {
        debug!(target: "tierguard::cli", actor = %self.actor, ?cmd, "execute");
        if let Command::As(actor) = cmd {
            self.actor = actor;
            return Ok(Outcome::Ok(format!("acting as {}", self.actor)));
        }
        let e = &self.engine;
        let me = &self.actor;
        let out = match cmd {
            Command::As(_) | Command::WhoAmI => Outcome::Ok(format!("acting as {me}")),
            Command::Register { handle, title } => {
                Outcome::from_result(e.register_entity(&handle, title, me), |()| format!("entity {handle} registered"))
            }
            Command::Deposit { target: t, content } => {
                Outcome::from_result(e.deposit_record(&t.entity, &t.record, content, me), |()| {
                    format!("record {}/{} deposited", t.entity, t.record)
                })
            }
            Command::Revise { target: t, content } => {
                Outcome::from_result(e.revise_record(&t.entity, &t.record, content, me), |iteration| {
                    format!("record {}/{} now at iteration {}", t.entity, t.record, iteration)
                })
            }
            Command::Grant { target: t, actor, level } => {
                Outcome::from_result(e.allocate_access(&t.entity, &t.record, &actor, level, me), |()| {
                    format!("{actor} granted level {level} on {}/{}", t.entity, t.record)
                })
            }
            Command::Revoke { target: t, actor } => {
                Outcome::from_result(e.revoke_access(&t.entity, &t.record, &actor, me), |()| {
                    format!("{actor} revoked on {}/{}", t.entity, t.record)
                })
            }
            Command::Retrieve(t) => Outcome::from_result(e.retrieve_record(&t.entity, &t.record, me), |()| {
                format!("retrieval of {}/{} logged", t.entity, t.record)
            }),
            Command::Purge(t) => Outcome::from_result(e.purge_record(&t.entity, &t.record, me), |()| {
                format!("record {}/{} purged", t.entity, t.record)
            }),
            Command::Entity(h) => Outcome::Entities(e.get_entity(&h).into_iter().collect()),
            Command::Record(t) => Outcome::Records(e.get_record(&t.entity, &t.record).into_iter().collect()),
            Command::Records(h) => Outcome::Records(e.records(&h)),
            Command::Tier { target: t, actor } => {
                let tier = e.get_tier(&t.entity, &t.record, &actor);
                Outcome::Tier { actor, tier }
            }
            Command::Event { target: t, sequence } => {
                Outcome::Events(e.get_event(&t.entity, &t.record, sequence).into_iter().collect())
            }
            Command::History(t) => Outcome::Events(e.history(&t.entity, &t.record)),
            Command::Grants(t) => Outcome::Grants(e.grants(&t.entity, &t.record)),
            Command::Save => match &self.snapshot_path {
                Some(path) => {
                    e.store().save_snapshot(path)?;
                    info!(target: "tierguard::cli", "snapshot saved to '{}'", path.display());
                    Outcome::Ok(format!("snapshot written to {}", path.display()))
                }
                None => Outcome::Ok("persistence disabled; nothing saved".to_string()),
            },
            Command::Help => Outcome::Help,
            Command::Quit => Outcome::Quit,
        };
        Ok(out)
    }

    /// Parse and run one line. Parse failures become an error line rather than
    /// ending the session.
    pub fn run_line(&mut self, line: &str) -> Result<Option<Outcome>> {
        match parse_command(line) {
            Ok(Some(cmd)) => self.execute(cmd).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Ok(Some(Outcome::Invalid(format!("{e:#}")))),
        }
    }

    /// Run commands from a reader until EOF or `quit`, writing results to `out`.
    pub fn run_script<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        let json = json_output_requested();
        for line in input.lines() {
            let line = line.context("reading console input")?;
            let Some(outcome) = self.run_line(&line)? else { continue; };
            if outcome == Outcome::Quit { break; }
            for l in outcome.render(terminal_width(), json) { writeln!(out, "{l}")?; }
        }
        Ok(())
    }

    /// Interactive session with line editing and history.
    pub fn run_interactive(&mut self) -> Result<()> {
        use rustyline::error::ReadlineError;
        let config = rustyline::Config::builder().auto_add_history(true).build();
        let mut rl = rustyline::DefaultEditor::with_config(config)?;
        let json = json_output_requested();
        println!("tierguard console. Type 'help' for commands.");
        loop {
            let prompt = format!("{}> ", self.actor);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let Some(outcome) = self.run_line(&line)? else { continue; };
                    if outcome == Outcome::Quit { break; }
                    for l in outcome.render(terminal_width(), json) { println!("{l}"); }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_keeps_quoted_runs() {
        let t = tokenize(r#"register acme "Acme Holdings Ltd""#).unwrap();
        assert_eq!(t, vec!["register", "acme", "Acme Holdings Ltd"]);
        assert_eq!(tokenize(r#"x """#).unwrap(), vec!["x", ""]);
        assert!(tokenize(r#"x "open"#).is_err());
    }

    #[test]
    fn blank_and_comment_lines_parse_to_nothing() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(parse_command("# note").unwrap(), None);
    }

    #[test]
    fn grant_accepts_levels_and_names() {
        let Some(Command::Grant { level, .. }) = parse_command("grant acme plan bob custodian").unwrap() else {
            panic!("expected grant");
        };
        assert_eq!(level, 3);
        let Some(Command::Grant { level, .. }) = parse_command("grant acme plan bob 99").unwrap() else {
            panic!("expected grant");
        };
        assert_eq!(level, 99);
        assert!(parse_command("grant acme plan bob owner").is_err());
    }

    #[test]
    fn deposit_joins_trailing_summary() {
        let line = format!("deposit acme plan {} memo \"Q3 plan\" draft for review", "ab".repeat(32));
        let Some(Command::Deposit { target, content }) = parse_command(&line).unwrap() else {
            panic!("expected deposit");
        };
        assert_eq!(target.record.as_str(), "plan");
        assert_eq!(content.title.as_str(), "Q3 plan");
        assert_eq!(content.summary.as_str(), "draft for review");
        assert_eq!(content.checksum, Checksum([0xab; 32]));
    }

    #[test]
    fn malformed_lines_are_reported() {
        assert!(parse_command("deposit acme plan zz doc t").is_err());
        assert!(parse_command("record acme").is_err());
        assert!(parse_command("frobnicate").is_err());
        assert!(parse_command(&format!("entity {}", "h".repeat(65))).is_err());
    }
}
