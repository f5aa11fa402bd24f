//! @dose
//! purpose: Reader for a mod's modinfo.lua. Runs the file in an embedded Lua 5.4 state
//!     (mlua), then reads the known globals into typed Field values and the
//!     configuration_options table into ConfigurationOption records.
//!
//! when-editing:
//!     - !FIELDS is the single list of supported globals; lookups by any other name fail
//!     - All values are copied out before the Lua state is dropped; nothing here holds Lua refs
//!
//! invariants:
//!     - A nil or false global reads as the zero value of its type ("" / 0 / false)
//!     - A global of the wrong type is an error, never silently coerced
//!     - Option defaults are the `options` entry whose data equals `default` (last match wins)
//!
//! gotchas:
//!     - Field values display as the workshop listing does: yes/no, "-" for empty strings
//!     - Option data displays the way Lua's tostring would (1.0 stays "1.0"), unlike fields
//!     - modinfo.lua is ordinary Lua; it runs with the standard library loaded

use mlua::{Lua, Table, Value};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

pub const MODINFO_FILE_NAME: &str = "modinfo.lua";

#[derive(Error, Debug)]
pub enum ModInfoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to evaluate mod info: {0}")]
    Lua(String),
    #[error("Field {name} is not a {expected}")]
    InvalidField {
        name: String,
        expected: &'static str,
    },
    #[error("Field {0} is not supported")]
    UnsupportedField(String),
    #[error("Mod info field {0} doesn't have any value")]
    MissingValue(String),
}

impl From<mlua::Error> for ModInfoError {
    fn from(e: mlua::Error) -> Self {
        ModInfoError::Lua(e.to_string())
    }
}

/// Which part of the mod info a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldGroup {
    General,
    Compatibility,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Bool,
    Integer,
    Number,
    String,
}

impl FieldType {
    fn label(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Integer | FieldType::Number => "number",
            FieldType::String => "string",
        }
    }

    fn zero(self) -> FieldValue {
        match self {
            FieldType::Bool => FieldValue::Bool(false),
            FieldType::Integer => FieldValue::Integer(0),
            FieldType::Number => FieldValue::Number(0.0),
            FieldType::String => FieldValue::String(String::new()),
        }
    }
}

struct FieldSpec {
    name: &'static str,
    description: &'static str,
    group: FieldGroup,
    kind: FieldType,
    required: bool,
}

const fn spec(
    name: &'static str,
    description: &'static str,
    group: FieldGroup,
    kind: FieldType,
    required: bool,
) -> FieldSpec {
    FieldSpec {
        name,
        description,
        group,
        kind,
        required,
    }
}

const FIELDS: &[FieldSpec] = &[
    spec("api_version", "API Version", FieldGroup::General, FieldType::Integer, true),
    spec("author", "Author", FieldGroup::General, FieldType::String, true),
    spec("description", "Description", FieldGroup::General, FieldType::String, true),
    spec("name", "Title", FieldGroup::General, FieldType::String, true),
    spec("version", "Version", FieldGroup::General, FieldType::String, true),
    spec(
        "dont_starve_compatible",
        "Don't Starve Compatible",
        FieldGroup::Compatibility,
        FieldType::Bool,
        true,
    ),
    spec(
        "dst_compatible",
        "Don't Starve Together Compatible",
        FieldGroup::Compatibility,
        FieldType::Bool,
        true,
    ),
    spec(
        "reign_of_giants_compatible",
        "Reign Of Giants Compatible",
        FieldGroup::Compatibility,
        FieldType::Bool,
        true,
    ),
    spec(
        "shipwrecked_compatible",
        "Shipwrecked Compatible",
        FieldGroup::Compatibility,
        FieldType::Bool,
        true,
    ),
    spec(
        "all_clients_require_mod",
        "All Clients Require Mod",
        FieldGroup::Other,
        FieldType::Bool,
        false,
    ),
    spec("client_only_mod", "Client Only Mod", FieldGroup::Other, FieldType::Bool, false),
    spec("folder_name", "Folder Title", FieldGroup::Other, FieldType::String, false),
    spec("forum_thread", "Forum Thread", FieldGroup::Other, FieldType::String, false),
    spec("icon", "Icon", FieldGroup::Other, FieldType::String, false),
    spec("icon_atlas", "Icon Atlas", FieldGroup::Other, FieldType::String, false),
    spec("priority", "Priority", FieldGroup::Other, FieldType::Number, false),
];

/// Value of a modinfo.lua global
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(true) => write!(f, "yes"),
            FieldValue::Bool(false) => write!(f, "no"),
            FieldValue::Integer(value) => write!(f, "{}", value),
            FieldValue::Number(value) => write!(f, "{}", value),
            FieldValue::String(value) if value.is_empty() => write!(f, "-"),
            FieldValue::String(value) => write!(f, "{}", value),
        }
    }
}

/// A supported modinfo.lua global
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Global name, e.g. "api_version"
    pub name: &'static str,
    /// Human-friendly label, e.g. "API Version"
    pub description: &'static str,
    pub group: FieldGroup,
    /// Whether the game expects the global to be set
    pub required: bool,
    pub value: FieldValue,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

/// The default choice of a configuration option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionDefault {
    /// `description` of the matching choice
    pub description: String,
    /// `data` of the matching choice, as Lua prints it
    pub data: String,
}

/// One entry of `configuration_options`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationOption {
    pub name: String,
    pub label: String,
    pub hover: String,
    pub default: OptionDefault,
}

/// Values read from a modinfo.lua file
#[derive(Debug, Clone)]
pub struct ModInfo {
    fields: Vec<Field>,
    configuration_options: Vec<ConfigurationOption>,
}

impl ModInfo {
    /// Run a modinfo.lua file and read its values
    pub fn load(path: &Path) -> Result<Self, ModInfoError> {
        let source = fs::read(path)?;
        tracing::debug!(path = %path.display(), bytes = source.len(), "evaluating mod info");
        Self::from_source(&source, &path.display().to_string())
    }

    /// Run Lua source and read its values; `chunk_name` shows up in Lua error messages
    pub fn from_source(source: &[u8], chunk_name: &str) -> Result<Self, ModInfoError> {
        let lua = Lua::new();
        lua.load(source).set_name(format!("@{}", chunk_name)).exec()?;

        let globals = lua.globals();
        let fields = FIELDS
            .iter()
            .map(|spec| {
                Ok(Field {
                    name: spec.name,
                    description: spec.description,
                    group: spec.group,
                    required: spec.required,
                    value: read_field(&globals, spec)?,
                })
            })
            .collect::<Result<Vec<_>, ModInfoError>>()?;
        let configuration_options = read_configuration_options(&globals)?;

        Ok(Self {
            fields,
            configuration_options,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a supported field by its global name
    pub fn field(&self, name: &str) -> Result<&Field, ModInfoError> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| ModInfoError::UnsupportedField(name.to_string()))
    }

    /// Non-empty string value of a field
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.field(name).ok().map(|field| &field.value) {
            Some(FieldValue::String(value)) if !value.is_empty() => Some(value),
            _ => None,
        }
    }

    /// Like text(), but a missing value is an error
    pub fn required_text(&self, name: &str) -> Result<&str, ModInfoError> {
        self.field(name)?;
        self.text(name)
            .ok_or_else(|| ModInfoError::MissingValue(name.to_string()))
    }

    pub fn configuration_options(&self) -> &[ConfigurationOption] {
        &self.configuration_options
    }
}

fn read_field(globals: &Table, spec: &FieldSpec) -> Result<FieldValue, ModInfoError> {
    let value: Value = globals.get(spec.name)?;

    let field = match (spec.kind, value) {
        (FieldType::Bool, Value::Boolean(value)) => FieldValue::Bool(value),
        (FieldType::Integer, Value::Integer(value)) => FieldValue::Integer(value),
        (FieldType::Integer, Value::Number(value)) => FieldValue::Integer(value as i64),
        (FieldType::Number, Value::Integer(value)) => FieldValue::Number(value as f64),
        (FieldType::Number, Value::Number(value)) => FieldValue::Number(value),
        (FieldType::String, Value::String(value)) => {
            FieldValue::String(value.to_string_lossy().into())
        }
        (kind, Value::Nil | Value::Boolean(false)) => kind.zero(),
        (kind, _) => {
            return Err(ModInfoError::InvalidField {
                name: spec.name.to_string(),
                expected: kind.label(),
            })
        }
    };

    Ok(field)
}

fn read_configuration_options(globals: &Table) -> Result<Vec<ConfigurationOption>, ModInfoError> {
    let Value::Table(options) = globals.get::<Value>("configuration_options")? else {
        return Ok(Vec::new());
    };

    options
        .sequence_values::<Value>()
        .map(|entry| read_option(entry?))
        .collect()
}

fn read_option(entry: Value) -> Result<ConfigurationOption, ModInfoError> {
    let Value::Table(option) = entry else {
        return Err(ModInfoError::InvalidField {
            name: "configuration_options".to_string(),
            expected: "table",
        });
    };

    let mut result = ConfigurationOption {
        name: option_string(&option, "name")?,
        label: option_string(&option, "label")?,
        hover: option_string(&option, "hover")?,
        default: OptionDefault::default(),
    };

    let default: Value = option.get("default")?;
    if let Value::Table(choices) = option.get::<Value>("options")? {
        for choice in choices.sequence_values::<Value>() {
            let Value::Table(choice) = choice? else {
                continue;
            };
            let data: Value = choice.get("data")?;
            if same_data(&data, &default) {
                result.default = OptionDefault {
                    description: match choice.get::<Value>("description")? {
                        Value::Nil => String::new(),
                        description => lua_display(&description),
                    },
                    data: lua_display(&data),
                };
            }
        }
    }

    Ok(result)
}

fn option_string(option: &Table, key: &str) -> Result<String, ModInfoError> {
    match option.get::<Value>(key)? {
        Value::String(value) => Ok(value.to_string_lossy().into()),
        Value::Nil => Ok(String::new()),
        _ => Err(ModInfoError::InvalidField {
            name: format!("configuration_options.{}", key),
            expected: "string",
        }),
    }
}

/// Raw equality for the scalar values option data can hold
fn same_data(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Integer(a), Value::Number(b)) | (Value::Number(b), Value::Integer(a)) => {
            *a as f64 == *b
        }
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a.to_string_lossy() == b.to_string_lossy(),
        _ => false,
    }
}

/// Render a value the way Lua's tostring does for scalars
fn lua_display(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(value) => value.to_string(),
        Value::Integer(value) => value.to_string(),
        Value::Number(value) if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{:.1}", value)
        }
        Value::Number(value) => value.to_string(),
        Value::String(value) => value.to_string_lossy().into(),
        other => other.type_name().to_string(),
    }
}
