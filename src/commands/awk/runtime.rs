//! AWK Runtime State
//!
//! Records, fields, variables, arrays, user functions, buffered output and
//! the control-flow flags. Field invariant: `fields[0]` would be `$0`; here
//! the record is kept separately and `fields` holds `$1..$NF`, so
//! `NF == fields.len()` throughout.

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex_lite::Regex;

use super::value::num_to_str;

const MAX_CALL_DEPTH: usize = 100;

/// Build the splitter for a field separator: the default `" "` splits on
/// whitespace runs, one char splits literally, longer specs are regexes.
pub fn field_separator_regex(fs: &str) -> Regex {
    let source = if fs == " " {
        r"[ \t\n]+".to_string()
    } else if fs.chars().count() == 1 {
        regex_lite::escape(fs)
    } else {
        fs.to_string()
    };
    Regex::new(&source).unwrap_or_else(|_| Regex::new(&regex_lite::escape(fs)).unwrap())
}

/// A function call frame: saved globals for scalar params plus array
/// aliasing for array params.
pub struct Frame {
    pub saved_scalars: Vec<(String, Option<String>)>,
    pub array_aliases: IndexMap<String, String>,
    /// Hidden arrays backing uninitialized local (extra) params.
    pub local_arrays: Vec<String>,
}

pub struct AwkRuntime {
    // Built-in variables
    pub fs: String,
    pub ofs: String,
    pub ors: String,
    pub subsep: String,
    pub nr: u64,
    pub filename: String,
    pub rstart: usize,
    pub rlength: i64,

    // Current record
    record: String,
    fields: Vec<String>,

    // User data
    pub vars: IndexMap<String, String>,
    pub arrays: IndexMap<String, IndexMap<String, String>>,
    pub frames: Vec<Frame>,

    // Main input (for getline)
    pub input: Vec<String>,
    pub input_pos: usize,

    // Output
    pub output: String,
    /// print redirections: path -> (content, truncate before flush).
    pub file_output: IndexMap<String, (String, bool)>,

    // Control
    pub exit_code: i32,
    pub exiting: bool,
    pub runtime_error: Option<String>,

    pub rng: StdRng,
    /// Last `srand` seed, returned by the next `srand` call.
    pub seed: f64,
}

impl AwkRuntime {
    pub fn new() -> Self {
        Self {
            fs: " ".to_string(),
            ofs: " ".to_string(),
            ors: "\n".to_string(),
            subsep: "\x1c".to_string(),
            nr: 0,
            filename: String::new(),
            rstart: 0,
            rlength: -1,
            record: String::new(),
            fields: Vec::new(),
            vars: IndexMap::new(),
            arrays: IndexMap::new(),
            frames: Vec::new(),
            input: Vec::new(),
            input_pos: 0,
            output: String::new(),
            file_output: IndexMap::new(),
            exit_code: 0,
            exiting: false,
            runtime_error: None,
            rng: StdRng::seed_from_u64(0),
            seed: 0.0,
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.runtime_error.is_none() {
            self.runtime_error = Some(message.into());
            self.exiting = true;
        }
    }

    pub fn at_call_depth_limit(&self) -> bool {
        self.frames.len() >= MAX_CALL_DEPTH
    }

    // -- records and fields --------------------------------------------------

    pub fn set_record(&mut self, line: &str) {
        self.record = line.to_string();
        self.split_record();
    }

    fn split_record(&mut self) {
        if self.record.is_empty() {
            self.fields = Vec::new();
            return;
        }
        if self.fs == " " {
            self.fields = self.record.split_whitespace().map(String::from).collect();
        } else {
            let re = field_separator_regex(&self.fs);
            self.fields = re.split(&self.record).map(String::from).collect();
        }
    }

    pub fn nf(&self) -> usize {
        self.fields.len()
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn get_field(&self, index: usize) -> String {
        if index == 0 {
            self.record.clone()
        } else {
            self.fields.get(index - 1).cloned().unwrap_or_default()
        }
    }

    /// Setting `$0` re-splits; setting `$i` rebuilds the record with OFS,
    /// extending NF when needed.
    pub fn set_field(&mut self, index: usize, value: String) {
        if index == 0 {
            self.record = value;
            self.split_record();
            return;
        }
        if self.fields.len() < index {
            self.fields.resize(index, String::new());
        }
        self.fields[index - 1] = value;
        self.rebuild_record();
    }

    /// NF assignment truncates or extends the record.
    pub fn set_nf(&mut self, nf: usize) {
        self.fields.resize(nf, String::new());
        self.rebuild_record();
    }

    fn rebuild_record(&mut self) {
        self.record = self.fields.join(&self.ofs);
    }

    // -- variables -----------------------------------------------------------

    pub fn get_var(&self, name: &str) -> String {
        match name {
            "NR" => return self.nr.to_string(),
            "NF" => return self.nf().to_string(),
            "FNR" => return self.nr.to_string(), // single input stream
            "FS" => return self.fs.clone(),
            "OFS" => return self.ofs.clone(),
            "ORS" => return self.ors.clone(),
            "SUBSEP" => return self.subsep.clone(),
            "FILENAME" => return self.filename.clone(),
            "RSTART" => return self.rstart.to_string(),
            "RLENGTH" => return self.rlength.to_string(),
            _ => {}
        }
        self.vars.get(name).cloned().unwrap_or_default()
    }

    pub fn set_var(&mut self, name: &str, value: String) {
        match name {
            "NR" => self.nr = super::value::to_num(&value) as u64,
            "NF" => {
                let nf = super::value::to_num(&value).max(0.0) as usize;
                self.set_nf(nf);
            }
            "FS" => self.fs = value,
            "OFS" => self.ofs = value,
            "ORS" => self.ors = value,
            "SUBSEP" => self.subsep = value,
            "FILENAME" => self.filename = value,
            "RSTART" => self.rstart = super::value::to_num(&value) as usize,
            "RLENGTH" => self.rlength = super::value::to_num(&value) as i64,
            _ => {
                self.vars.insert(name.to_string(), value);
            }
        }
    }

    /// Resolve an array name through the active call frame's aliases.
    pub fn resolve_array(&self, name: &str) -> String {
        if let Some(frame) = self.frames.last() {
            if let Some(actual) = frame.array_aliases.get(name) {
                return actual.clone();
            }
        }
        name.to_string()
    }

    pub fn array_get(&self, name: &str, key: &str) -> String {
        let actual = self.resolve_array(name);
        self.arrays
            .get(&actual)
            .and_then(|a| a.get(key))
            .cloned()
            .unwrap_or_default()
    }

    pub fn array_set(&mut self, name: &str, key: String, value: String) {
        let actual = self.resolve_array(name);
        self.arrays.entry(actual).or_default().insert(key, value);
    }

    pub fn array_has(&self, name: &str, key: &str) -> bool {
        let actual = self.resolve_array(name);
        self.arrays.get(&actual).is_some_and(|a| a.contains_key(key))
    }

    // -- output --------------------------------------------------------------

    pub fn emit(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn emit_to_file(&mut self, path: &str, text: &str, truncate_first: bool) {
        let entry = self
            .file_output
            .entry(path.to_string())
            .or_insert_with(|| (String::new(), truncate_first));
        entry.0.push_str(text);
    }

    /// Join subscripts with SUBSEP for multi-dimensional access.
    pub fn subscript_key(&self, parts: &[String]) -> String {
        parts.join(&self.subsep)
    }

    /// Format a number for output contexts.
    pub fn render_num(&self, value: f64) -> String {
        num_to_str(value)
    }
}

impl Default for AwkRuntime {
    fn default() -> Self {
        Self::new()
    }
}
