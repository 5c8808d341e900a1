use std::io::{self, BufRead, Write};
use tinylink_core::{SessionToken, ShortCode};
use tinylink_generator::Generator;
use tinylink_shortener::ShortenerService;
use tinylink_storage::Persistence;
use tracing::debug;

const HELP: &str = "\
commands:
  register <login> <password>  create an account and log in
  login <login> <password>     log in to an existing account
  create <url> <limit>         shorten <url>, allowing <limit> clicks
  open <code>                  follow a short link
  mylinks                      list your links
  help                         show this message
  exit                         quit";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Register { login: &'a str, password: &'a str },
    Login { login: &'a str, password: &'a str },
    Create { url: &'a str, limit: u32 },
    Open { code: &'a str },
    MyLinks,
    Help,
    Exit,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Result<Self, String> {
        let args: Vec<&str> = line.split_whitespace().collect();
        match args.as_slice() {
            ["register", login, password] => Ok(Command::Register {
                login: *login,
                password: *password,
            }),
            ["login", login, password] => Ok(Command::Login {
                login: *login,
                password: *password,
            }),
            ["create", url, limit] => {
                let limit = limit
                    .parse()
                    .map_err(|_| format!("invalid input: click limit '{}' is not a number", limit))?;
                Ok(Command::Create { url: *url, limit })
            }
            ["open", code] => Ok(Command::Open { code: *code }),
            ["mylinks"] => Ok(Command::MyLinks),
            ["help"] => Ok(Command::Help),
            ["exit"] => Ok(Command::Exit),
            [name, ..] => Err(format!("unknown or malformed command '{}', try 'help'", name)),
            [] => Err("empty command".to_string()),
        }
    }
}

/// Line-oriented front end over a [`ShortenerService`].
///
/// Holds at most one logged-in session; every command writes its result to
/// `out`.
pub struct Shell<'s, G, P, W> {
    service: &'s ShortenerService<G, P>,
    base_url: String,
    session: Option<SessionToken>,
    out: W,
}

impl<'s, G: Generator, P: Persistence, W: Write> Shell<'s, G, P, W> {
    pub fn new(service: &'s ShortenerService<G, P>, base_url: impl Into<String>, out: W) -> Self {
        Self {
            service,
            base_url: base_url.into(),
            session: None,
            out,
        }
    }

    /// Reads commands until `exit` or end of input.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        writeln!(self.out, "tinylink shell, type 'help' for commands")?;
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if !self.execute(&line)? {
                break;
            }
        }
        self.out.flush()
    }

    /// Runs one command line. Returns `false` once the user asked to exit.
    pub fn execute(&mut self, line: &str) -> io::Result<bool> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(self.out, "error: {}", message)?;
                return Ok(true);
            }
        };
        debug!(?command, "shell command");

        match command {
            Command::Register { login, password } => {
                match self.service.register(login, password) {
                    Ok(token) => {
                        self.session = Some(token);
                        writeln!(self.out, "registered {}, your token is {}", login, token)?;
                    }
                    Err(e) => writeln!(self.out, "error: {}", e)?,
                }
            }
            Command::Login { login, password } => {
                match self.service.authenticate(login, password) {
                    Ok(token) => {
                        self.session = Some(token);
                        writeln!(self.out, "logged in as {}", login)?;
                    }
                    Err(e) => writeln!(self.out, "error: {}", e)?,
                }
            }
            Command::Create { url, limit } => {
                let Some(token) = self.session else {
                    writeln!(self.out, "error: please log in first")?;
                    return Ok(true);
                };
                match self.service.create_link(&token, url, limit) {
                    Ok(link) => writeln!(
                        self.out,
                        "short link: {} ({} clicks, expires {})",
                        link.code.to_url(&self.base_url),
                        link.clicks_remaining,
                        link.expires_at
                    )?,
                    Err(e) => writeln!(self.out, "error: {}", e)?,
                }
            }
            Command::Open { code } => {
                let result = ShortCode::parse_with_base(code, &self.base_url)
                    .map_err(Into::into)
                    .and_then(|code| self.service.consume_click(&code));
                match result {
                    Ok(link) => writeln!(self.out, "Redirecting to: {}", link.target_url)?,
                    Err(e) => writeln!(self.out, "error: {}", e)?,
                }
            }
            Command::MyLinks => {
                let Some(token) = self.session else {
                    writeln!(self.out, "error: please log in first")?;
                    return Ok(true);
                };
                let links = self.service.list_for_user(&token);
                if links.is_empty() {
                    writeln!(self.out, "you have no links")?;
                }
                for link in links {
                    writeln!(
                        self.out,
                        "{} -> {} ({} clicks left, expires {})",
                        link.code.to_url(&self.base_url),
                        link.target_url,
                        link.clicks_remaining,
                        link.expires_at
                    )?;
                }
            }
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Exit => {
                writeln!(self.out, "bye")?;
                return Ok(false);
            }
        }
        Ok(true)
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.out
    }
}
