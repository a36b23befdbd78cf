//! Console command splitting for stufftext payloads.
//!
//! Mirrors how the Quake console buffer executes text: commands end at `;`
//! (outside double quotes) or at a newline (always), and each command is
//! split into whitespace-separated tokens where a quoted run stays inside
//! its token.  Quote characters are kept in the token so that the canonical
//! form of a command parses back to the same command.

use std::fmt;

/// One console command parsed out of a stufftext payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubCommand {
    pub name: String,
    pub args: Vec<String>,
}

impl SubCommand {
    /// `name`, or `name` followed by the arguments joined by single spaces.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SubCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Split `text` into the console commands it contains, in order.
///
/// Empty commands (`;;`, blank lines) produce nothing.  A quote left open at
/// the end of a command is closed there.  Only ASCII whitespace separates
/// tokens; high-bit Quake characters such as 0xA0 are part of the text.
pub fn parse(text: &str) -> Vec<SubCommand> {
    let mut tokenizer = Tokenizer::default();

    for ch in text.chars() {
        match ch {
            '\n' => tokenizer.end_command(),
            ';' if !tokenizer.in_quotes => tokenizer.end_command(),
            '"' => {
                tokenizer.in_quotes = !tokenizer.in_quotes;
                tokenizer.token.push(ch);
            }
            c if c.is_ascii_whitespace() && !tokenizer.in_quotes => tokenizer.end_token(),
            c => tokenizer.token.push(c),
        }
    }
    tokenizer.end_command();

    tokenizer.commands
}

#[derive(Default)]
struct Tokenizer {
    in_quotes: bool,
    token: String,
    tokens: Vec<String>,
    commands: Vec<SubCommand>,
}

impl Tokenizer {
    fn end_token(&mut self) {
        if !self.token.is_empty() {
            self.tokens.push(std::mem::take(&mut self.token));
        }
    }

    fn end_command(&mut self) {
        if self.in_quotes {
            self.token.push('"');
            self.in_quotes = false;
        }
        self.end_token();

        let mut tokens = std::mem::take(&mut self.tokens).into_iter();
        if let Some(name) = tokens.next() {
            self.commands.push(SubCommand {
                name,
                args: tokens.collect(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(text: &str) -> Vec<String> {
        parse(text).iter().map(SubCommand::canonical).collect()
    }

    #[test]
    fn single_command_without_args() {
        let cmds = parse("reconnect\n");
        assert_eq!(
            cmds,
            vec![SubCommand {
                name: "reconnect".to_string(),
                args: vec![],
            }]
        );
        assert_eq!(cmds[0].canonical(), "reconnect");
    }

    #[test]
    fn semicolons_separate_commands() {
        assert_eq!(
            canonical("say hi;rm -rf /;name bob"),
            vec!["say hi", "rm -rf /", "name bob"]
        );
    }

    #[test]
    fn newlines_separate_commands() {
        assert_eq!(canonical("cmd new\nskins\n"), vec!["cmd new", "skins"]);
    }

    #[test]
    fn whitespace_is_collapsed() {
        let cmds = parse("  say \t hello   world \r\n");
        assert_eq!(cmds[0].name, "say");
        assert_eq!(cmds[0].args, vec!["hello", "world"]);
        assert_eq!(cmds[0].canonical(), "say hello world");
    }

    #[test]
    fn high_bit_spaces_stay_inside_tokens() {
        let cmds = parse("name a\u{a0}b\u{85}c\n");
        assert_eq!(cmds[0].args, vec!["a\u{a0}b\u{85}c"]);
        assert_eq!(cmds[0].canonical(), "name a\u{a0}b\u{85}c");
    }

    #[test]
    fn empty_commands_are_skipped() {
        assert_eq!(canonical(";;say hi;; ;\n\n"), vec!["say hi"]);
        assert!(parse("").is_empty());
        assert!(parse(" ;\n ").is_empty());
    }

    #[test]
    fn quotes_protect_separators() {
        let cmds = parse(r#"alias go "say a; say b";echo done"#);
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0].name, "alias");
        assert_eq!(cmds[0].args, vec!["go", r#""say a; say b""#]);
        assert_eq!(cmds[1].canonical(), "echo done");
    }

    #[test]
    fn newline_ends_command_even_inside_quotes() {
        assert_eq!(
            canonical("say \"unterminated\nname bob"),
            vec!["say \"unterminated\"", "name bob"]
        );
    }

    #[test]
    fn unterminated_quote_is_closed() {
        assert_eq!(canonical(r#"say "a;b"#), vec![r#"say "a;b""#]);
    }

    #[test]
    fn canonical_form_reparses_identically() {
        let inputs = [
            "say hi;rm -rf /;name bob\n",
            r#"alias x "a b;c";bind  space  "+jump"   "#,
            "say \"open\ncolor 4",
            "  ;;;  ",
        ];
        for input in inputs {
            let once = canonical(input);
            let twice = canonical(&once.join(";"));
            assert_eq!(once, twice, "input {input:?}");
        }
    }
}
