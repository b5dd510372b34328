//! sed Script Parser
//!
//! Addresses (line numbers, `$`, `/re/`, ranges) and the command set:
//! `s///`, `p`, `d`, `q`, `y///`, `a`, `i`. BRE is the default dialect;
//! the executor translates it before compiling.

#[derive(Debug, Clone, PartialEq)]
pub enum Address {
    Line(usize),
    Last,
    Regex(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AddrSpec {
    One(Address),
    Range(Address, Address),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SedCmd {
    Substitute {
        pattern: String,
        replacement: String,
        global: bool,
        print: bool,
        ignore_case: bool,
        /// `s/x/y/2` replaces only the Nth occurrence.
        occurrence: Option<usize>,
    },
    Print,
    Delete,
    Quit,
    Translate {
        from: Vec<char>,
        to: Vec<char>,
    },
    Append(String),
    Insert(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub address: Option<AddrSpec>,
    pub cmd: SedCmd,
}

pub fn parse_script(script: &str) -> Result<Vec<Instruction>, String> {
    let chars: Vec<char> = script.chars().collect();
    let mut parser = SedParser { chars, pos: 0 };
    parser.parse()
}

struct SedParser {
    chars: Vec<char>,
    pos: usize,
}

impl SedParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.pos += 1;
        }
    }

    fn parse(&mut self) -> Result<Vec<Instruction>, String> {
        let mut instructions = Vec::new();
        loop {
            while matches!(self.peek(), Some(';') | Some('\n') | Some(' ') | Some('\t')) {
                self.pos += 1;
            }
            if self.peek().is_none() {
                break;
            }
            instructions.push(self.parse_instruction()?);
        }
        Ok(instructions)
    }

    fn parse_instruction(&mut self) -> Result<Instruction, String> {
        let address = self.parse_addr_spec()?;
        self.skip_blank();
        let cmd = match self.bump() {
            Some('s') => self.parse_substitute()?,
            Some('y') => self.parse_translate()?,
            Some('p') => SedCmd::Print,
            Some('d') => SedCmd::Delete,
            Some('q') => SedCmd::Quit,
            Some('a') => SedCmd::Append(self.parse_text_arg()),
            Some('i') => SedCmd::Insert(self.parse_text_arg()),
            Some(other) => return Err(format!("unknown command: `{}'", other)),
            None => return Err("missing command".to_string()),
        };
        Ok(Instruction { address, cmd })
    }

    fn parse_addr_spec(&mut self) -> Result<Option<AddrSpec>, String> {
        let Some(first) = self.parse_address()? else {
            return Ok(None);
        };
        if self.peek() == Some(',') {
            self.pos += 1;
            let second = self
                .parse_address()?
                .ok_or_else(|| "expected address after ','".to_string())?;
            return Ok(Some(AddrSpec::Range(first, second)));
        }
        Ok(Some(AddrSpec::One(first)))
    }

    fn parse_address(&mut self) -> Result<Option<Address>, String> {
        self.skip_blank();
        match self.peek() {
            Some('$') => {
                self.pos += 1;
                Ok(Some(Address::Last))
            }
            Some(c) if c.is_ascii_digit() => {
                let mut n = 0usize;
                while let Some(c) = self.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    n = n * 10 + (c as usize - '0' as usize);
                    self.pos += 1;
                }
                Ok(Some(Address::Line(n)))
            }
            Some('/') => {
                self.pos += 1;
                let re = self.read_until_delim('/')?;
                Ok(Some(Address::Regex(re)))
            }
            _ => Ok(None),
        }
    }

    /// Read up to the next unescaped delimiter; `\d` for the active
    /// delimiter unescapes to the bare character.
    fn read_until_delim(&mut self, delim: char) -> Result<String, String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(format!("unterminated expression (expected `{}')", delim)),
                Some('\\') => match self.peek() {
                    Some(c) if c == delim => {
                        out.push(c);
                        self.pos += 1;
                    }
                    _ => out.push('\\'),
                },
                Some(c) if c == delim => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_substitute(&mut self) -> Result<SedCmd, String> {
        let delim = self.bump().ok_or("unterminated `s' command")?;
        let pattern = self.read_until_delim(delim)?;
        let replacement = self.read_until_delim(delim)?;

        let mut global = false;
        let mut print = false;
        let mut ignore_case = false;
        let mut occurrence = None;
        while let Some(c) = self.peek() {
            match c {
                'g' => global = true,
                'p' => print = true,
                'i' | 'I' => ignore_case = true,
                '0'..='9' => {
                    let mut n = 0usize;
                    while let Some(d) = self.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        n = n * 10 + (d as usize - '0' as usize);
                        self.pos += 1;
                    }
                    occurrence = Some(n.max(1));
                    continue;
                }
                _ => break,
            }
            self.pos += 1;
        }
        Ok(SedCmd::Substitute { pattern, replacement, global, print, ignore_case, occurrence })
    }

    fn parse_translate(&mut self) -> Result<SedCmd, String> {
        let delim = self.bump().ok_or("unterminated `y' command")?;
        let from: Vec<char> = self.read_until_delim(delim)?.chars().collect();
        let to: Vec<char> = self.read_until_delim(delim)?.chars().collect();
        if from.len() != to.len() {
            return Err("strings for `y' command are different lengths".to_string());
        }
        Ok(SedCmd::Translate { from, to })
    }

    /// Text for `a`/`i`: GNU one-liner form (`a text`) and the classic
    /// backslash-newline form.
    fn parse_text_arg(&mut self) -> String {
        if self.peek() == Some('\\') {
            self.pos += 1;
            if self.peek() == Some('\n') {
                self.pos += 1;
            }
        }
        self.skip_blank();
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.pos += 1;
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_substitute() {
        let script = parse_script("s/foo/bar/").unwrap();
        assert_eq!(script.len(), 1);
        match &script[0].cmd {
            SedCmd::Substitute { pattern, replacement, global, .. } => {
                assert_eq!(pattern, "foo");
                assert_eq!(replacement, "bar");
                assert!(!global);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_substitute_flags() {
        match &parse_script("s/a/b/gip").unwrap()[0].cmd {
            SedCmd::Substitute { global, print, ignore_case, .. } => {
                assert!(*global && *print && *ignore_case);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_substitute_occurrence() {
        match &parse_script("s/a/b/2").unwrap()[0].cmd {
            SedCmd::Substitute { occurrence, .. } => assert_eq!(*occurrence, Some(2)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alternate_delimiter() {
        match &parse_script("s|/usr|/opt|").unwrap()[0].cmd {
            SedCmd::Substitute { pattern, replacement, .. } => {
                assert_eq!(pattern, "/usr");
                assert_eq!(replacement, "/opt");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_addresses() {
        let script = parse_script("3d").unwrap();
        assert_eq!(script[0].address, Some(AddrSpec::One(Address::Line(3))));

        let script = parse_script("$p").unwrap();
        assert_eq!(script[0].address, Some(AddrSpec::One(Address::Last)));

        let script = parse_script("/x/d").unwrap();
        assert_eq!(
            script[0].address,
            Some(AddrSpec::One(Address::Regex("x".to_string())))
        );
    }

    #[test]
    fn test_address_range() {
        let script = parse_script("2,4d").unwrap();
        assert_eq!(
            script[0].address,
            Some(AddrSpec::Range(Address::Line(2), Address::Line(4)))
        );

        let script = parse_script("/a/,/b/p").unwrap();
        assert!(matches!(script[0].address, Some(AddrSpec::Range(_, _))));
    }

    #[test]
    fn test_multiple_commands() {
        let script = parse_script("s/a/b/; 2d\np").unwrap();
        assert_eq!(script.len(), 3);
    }

    #[test]
    fn test_translate() {
        match &parse_script("y/abc/xyz/").unwrap()[0].cmd {
            SedCmd::Translate { from, to } => {
                assert_eq!(from.len(), 3);
                assert_eq!(to[0], 'x');
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(parse_script("y/ab/xyz/").is_err());
    }

    #[test]
    fn test_append_insert() {
        assert_eq!(parse_script("a hello").unwrap()[0].cmd, SedCmd::Append("hello".to_string()));
        assert_eq!(parse_script("i\\hello").unwrap()[0].cmd, SedCmd::Insert("hello".to_string()));
    }

    #[test]
    fn test_escaped_delimiter_in_pattern() {
        match &parse_script("s/a\\/b/x/").unwrap()[0].cmd {
            SedCmd::Substitute { pattern, .. } => assert_eq!(pattern, "a/b"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_script("z").is_err());
    }

    #[test]
    fn test_unterminated_substitute() {
        assert!(parse_script("s/a/b").is_err());
    }
}
