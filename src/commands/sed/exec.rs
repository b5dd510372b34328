//! sed Execution
//!
//! Runs a parsed script over the input line by line: address matching with
//! stateful ranges, substitution with backreferences, and the auto-print
//! cycle (`-n` suppresses it).

use regex_lite::{Regex, RegexBuilder};

use crate::commands::grep::translate_posix_classes;

use super::parser::{AddrSpec, Address, Instruction, SedCmd};

pub struct SedRun {
    pub output: String,
    pub quit: bool,
}

/// Translate a BRE into the dialect regex-lite understands: `\(`...`\)`
/// become groups, bare `(){}+?|` become literals.
pub fn translate_bre(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut in_class = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_class {
            out.push(c);
            if c == ']' {
                in_class = false;
            }
            i += 1;
            continue;
        }
        match c {
            '[' => {
                in_class = true;
                out.push('[');
                i += 1;
            }
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                match next {
                    '(' | ')' | '{' | '}' | '+' | '?' | '|' => out.push(next),
                    _ => {
                        out.push('\\');
                        out.push(next);
                    }
                }
                i += 2;
            }
            '(' | ')' | '{' | '}' | '+' | '?' | '|' => {
                out.push('\\');
                out.push(c);
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn compile(pattern: &str, extended: bool, ignore_case: bool) -> Result<Regex, String> {
    let translated = if extended { pattern.to_string() } else { translate_bre(pattern) };
    let translated = translate_posix_classes(&translated);
    RegexBuilder::new(&translated)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|_| format!("invalid regex: {}", pattern))
}

/// `&` and `\1`..`\9` in the replacement.
fn expand_replacement(replacement: &str, captures: &regex_lite::Captures) -> String {
    let chars: Vec<char> = replacement.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                match next {
                    '&' => out.push('&'),
                    '\\' => out.push('\\'),
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    '1'..='9' => {
                        let group = next.to_digit(10).unwrap() as usize;
                        if let Some(m) = captures.get(group) {
                            out.push_str(m.as_str());
                        }
                    }
                    other => out.push(other),
                }
                i += 2;
            }
            '&' => {
                if let Some(m) = captures.get(0) {
                    out.push_str(m.as_str());
                }
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Per-instruction range activation state.
struct RangeState {
    active: bool,
}

pub struct SedExecutor<'s> {
    script: &'s [Instruction],
    extended: bool,
    quiet: bool,
    ranges: Vec<RangeState>,
}

impl<'s> SedExecutor<'s> {
    pub fn new(script: &'s [Instruction], extended: bool, quiet: bool) -> Self {
        let ranges = script.iter().map(|_| RangeState { active: false }).collect();
        Self { script, extended, quiet, ranges }
    }

    pub fn run(&mut self, input: &str) -> Result<SedRun, String> {
        let script = self.script;
        let lines: Vec<&str> = input.lines().collect();
        let total = lines.len();
        let mut output = String::new();
        let mut quit = false;

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            let is_last = line_no == total;
            let mut pattern_space = line.to_string();
            let mut deleted = false;
            let mut appends: Vec<String> = Vec::new();

            for (instr_idx, instruction) in script.iter().enumerate() {
                if !self.address_matches(instr_idx, &pattern_space, line_no, is_last)? {
                    continue;
                }
                match &instruction.cmd {
                    SedCmd::Substitute {
                        pattern,
                        replacement,
                        global,
                        print,
                        ignore_case,
                        occurrence,
                    } => {
                        let re = compile(pattern, self.extended, *ignore_case)?;
                        let (new_space, changed) = substitute(
                            &re,
                            &pattern_space,
                            replacement,
                            *global,
                            occurrence.unwrap_or(1),
                        );
                        pattern_space = new_space;
                        if changed && *print {
                            output.push_str(&pattern_space);
                            output.push('\n');
                        }
                    }
                    SedCmd::Print => {
                        output.push_str(&pattern_space);
                        output.push('\n');
                    }
                    SedCmd::Delete => {
                        deleted = true;
                        break;
                    }
                    SedCmd::Quit => {
                        quit = true;
                        break;
                    }
                    SedCmd::Translate { from, to } => {
                        pattern_space = pattern_space
                            .chars()
                            .map(|c| match from.iter().position(|f| *f == c) {
                                Some(pos) => to[pos],
                                None => c,
                            })
                            .collect();
                    }
                    SedCmd::Append(text) => appends.push(text.clone()),
                    SedCmd::Insert(text) => {
                        output.push_str(text);
                        output.push('\n');
                    }
                }
            }

            if !deleted && !self.quiet {
                output.push_str(&pattern_space);
                output.push('\n');
            }
            for text in appends {
                output.push_str(&text);
                output.push('\n');
            }
            if quit {
                break;
            }
        }
        Ok(SedRun { output, quit })
    }

    fn address_matches(
        &mut self,
        instr_idx: usize,
        pattern_space: &str,
        line_no: usize,
        is_last: bool,
    ) -> Result<bool, String> {
        let Some(spec) = &self.script[instr_idx].address else {
            return Ok(true);
        };
        match spec {
            AddrSpec::One(addr) => self.one_matches(addr, pattern_space, line_no, is_last),
            AddrSpec::Range(start, end) => {
                if self.ranges[instr_idx].active {
                    if self.one_matches(end, pattern_space, line_no, is_last)? {
                        self.ranges[instr_idx].active = false;
                    }
                    Ok(true)
                } else if self.one_matches(start, pattern_space, line_no, is_last)? {
                    // A line-number end that is already behind us closes
                    // the range immediately.
                    let closes_now = match end {
                        Address::Line(n) => *n <= line_no,
                        _ => false,
                    };
                    self.ranges[instr_idx].active = !closes_now;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    fn one_matches(
        &self,
        addr: &Address,
        pattern_space: &str,
        line_no: usize,
        is_last: bool,
    ) -> Result<bool, String> {
        Ok(match addr {
            Address::Line(n) => *n == line_no,
            Address::Last => is_last,
            Address::Regex(re) => compile(re, self.extended, false)?.is_match(pattern_space),
        })
    }
}

fn substitute(
    re: &Regex,
    subject: &str,
    replacement: &str,
    global: bool,
    occurrence: usize,
) -> (String, bool) {
    let mut out = String::new();
    let mut last = 0usize;
    let mut count = 0usize;
    let mut changed = false;

    for captures in re.captures_iter(subject) {
        let m = captures.get(0).expect("group 0 always present");
        count += 1;
        let replace_this = if global { count >= occurrence } else { count == occurrence };
        if replace_this {
            out.push_str(&subject[last..m.start()]);
            out.push_str(&expand_replacement(replacement, &captures));
            last = m.end();
            changed = true;
            if !global {
                break;
            }
        }
        // Empty matches must not loop forever.
        if m.start() == m.end() && m.end() >= last && last < subject.len() && global {
            let next_char = subject[last..].chars().next().unwrap();
            out.push(next_char);
            last += next_char.len_utf8();
        }
    }
    out.push_str(&subject[last..]);
    (out, changed)
}
