// src/nuget/install_script.rs
//! Chocolatey install script generation
//!
//! Renders `tools/chocolateyInstall.ps1`: one `$packageArgs` hashtable holding
//! the installer arguments, followed by the call that hands it to Chocolatey.

/// Line that consumes the argument block
pub const INVOCATION: &str = "Install-ChocolateyPackage @packageArgs";

/// Path of the script relative to the package root
pub const SCRIPT_PATH: &str = "tools/chocolateyInstall.ps1";

/// A value in the argument block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    Str(String),
    Int(i64),
    IntList(Vec<i64>),
    Bool(bool),
}

impl ScriptValue {
    fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            Self::IntList(list) => list.is_empty(),
            Self::Int(_) | Self::Bool(_) => false,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Str(s) => quote(s),
            Self::Int(n) => n.to_string(),
            Self::IntList(list) => {
                let items: Vec<String> = list.iter().map(i64::to_string).collect();
                format!("@({})", items.join(","))
            }
            Self::Bool(true) => "$True".to_string(),
            Self::Bool(false) => "$False".to_string(),
        }
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ScriptValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Vec<i64>> for ScriptValue {
    fn from(value: Vec<i64>) -> Self {
        Self::IntList(value)
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// PowerShell single-quoted literal; embedded quotes are doubled
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Ordered installer arguments for one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallScriptSpec {
    package_name: String,
    fields: Vec<(String, ScriptValue)>,
}

impl InstallScriptSpec {
    pub fn new(package_name: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Set a field. Empty values are dropped; an existing name keeps its slot.
    pub fn set(&mut self, name: &str, value: impl Into<ScriptValue>) {
        let value = value.into();
        if value.is_empty() {
            self.fields.retain(|(n, _)| n != name);
            return;
        }
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Builder form of [`set`](Self::set)
    pub fn field(mut self, name: &str, value: impl Into<ScriptValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn file_type(self, file_type: &str) -> Self {
        self.field("fileType", file_type)
    }

    pub fn url(self, url: &str) -> Self {
        self.field("url", url)
    }

    pub fn url64(self, url: &str) -> Self {
        self.field("url64bit", url)
    }

    pub fn silent_args(self, args: &str) -> Self {
        self.field("silentArgs", args)
    }

    pub fn valid_exit_codes(self, codes: Vec<i64>) -> Self {
        self.field("validExitCodes", codes)
    }

    pub fn checksum(self, checksum: &str, algorithm: &str) -> Self {
        self.field("checksum", checksum)
            .field("checksumType", algorithm)
    }

    pub fn checksum64(self, checksum: &str, algorithm: &str) -> Self {
        self.field("checksum64", checksum)
            .field("checksumType64", algorithm)
    }

    pub fn get(&self, name: &str) -> Option<&ScriptValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &ScriptValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Render the install script
    pub fn render(&self) -> String {
        let mut out = String::from("$packageArgs = @{\n");
        out.push_str(&format!("  packageName = {}\n", quote(&self.package_name)));
        for (name, value) in &self.fields {
            out.push_str(&format!("  {} = {}\n", name, value.render()));
        }
        out.push_str("}\n\n");
        out.push_str(INVOCATION);
        out.push('\n');
        out
    }
}
