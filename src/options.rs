use json::{object, JsonValue};
use std::fmt;
use std::fs::read_to_string;
use tracing::debug;

pub const ELEMENTS_COUNT_UP: &str = "Number of elements up";
pub const ELEMENTS_COUNT_ACROSS: &str = "Number of elements across";
pub const WALL_THICKNESS_LEFT: &str = "Wall thickness left";
pub const WALL_THICKNESS_RIGHT: &str = "Wall thickness right";
pub const APEX_SCALE_FACTOR_IDENTIFIER_OFFSET: &str = "Apex scale factor identifier offset";
pub const USE_CROSS_DERIVATIVES: &str = "Use cross derivatives";

/// Option names in the order a host should present them
pub const ORDERED_OPTION_NAMES: [&str; 6] = [
    ELEMENTS_COUNT_UP,
    ELEMENTS_COUNT_ACROSS,
    WALL_THICKNESS_LEFT,
    WALL_THICKNESS_RIGHT,
    APEX_SCALE_FACTOR_IDENTIFIER_OFFSET,
    USE_CROSS_DERIVATIVES,
];

/// Minimum number of elements up the sphere and across the septum
pub const MIN_ELEMENTS_COUNT: i64 = 2;
/// Maximum thickness of either wall (the shell has unit diameter)
pub const MAX_WALL_THICKNESS: f64 = 0.5;

/// A dynamically typed option value, as exchanged with a host application
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OptionValue {
    Integer(i64),
    Real(f64),
    Boolean(bool),
}

impl OptionValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
        }
    }
}

/// The options recognized by the sphere shell septum mesh type.
///
/// Values are stored as the host supplies them; [MeshOptions::check] clamps
/// them into their valid ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshOptions {
    pub elements_count_up: i64,
    pub elements_count_across: i64,
    pub wall_thickness_left: f64,
    pub wall_thickness_right: f64,
    pub apex_scale_factor_identifier_offset: i64,
    pub use_cross_derivatives: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            elements_count_up: 4,
            elements_count_across: 2,
            wall_thickness_left: 0.25,
            wall_thickness_right: 0.25,
            apex_scale_factor_identifier_offset: 10000,
            use_cross_derivatives: false,
        }
    }
}

impl MeshOptions {
    /// Look up an option by its host-facing name
    pub fn get(&self, name: &str) -> Option<OptionValue> {
        match name {
            ELEMENTS_COUNT_UP => Some(OptionValue::Integer(self.elements_count_up)),
            ELEMENTS_COUNT_ACROSS => Some(OptionValue::Integer(self.elements_count_across)),
            WALL_THICKNESS_LEFT => Some(OptionValue::Real(self.wall_thickness_left)),
            WALL_THICKNESS_RIGHT => Some(OptionValue::Real(self.wall_thickness_right)),
            APEX_SCALE_FACTOR_IDENTIFIER_OFFSET => Some(OptionValue::Integer(
                self.apex_scale_factor_identifier_offset,
            )),
            USE_CROSS_DERIVATIVES => Some(OptionValue::Boolean(self.use_cross_derivatives)),
            _ => None,
        }
    }

    /// Set an option by its host-facing name.
    ///
    /// Integer values are accepted for real-valued options. No clamping is applied here.
    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), OptionError> {
        match (name, value) {
            (ELEMENTS_COUNT_UP, OptionValue::Integer(v)) => self.elements_count_up = v,
            (ELEMENTS_COUNT_ACROSS, OptionValue::Integer(v)) => self.elements_count_across = v,
            (WALL_THICKNESS_LEFT, OptionValue::Real(v)) => self.wall_thickness_left = v,
            (WALL_THICKNESS_LEFT, OptionValue::Integer(v)) => self.wall_thickness_left = v as f64,
            (WALL_THICKNESS_RIGHT, OptionValue::Real(v)) => self.wall_thickness_right = v,
            (WALL_THICKNESS_RIGHT, OptionValue::Integer(v)) => {
                self.wall_thickness_right = v as f64
            }
            (APEX_SCALE_FACTOR_IDENTIFIER_OFFSET, OptionValue::Integer(v)) => {
                self.apex_scale_factor_identifier_offset = v
            }
            (USE_CROSS_DERIVATIVES, OptionValue::Boolean(v)) => self.use_cross_derivatives = v,
            (name, value) => {
                return Err(match self.get(name) {
                    Some(current) => OptionError::WrongType {
                        name: name.to_string(),
                        expected: current.type_name(),
                        found: value.type_name(),
                    },
                    None => OptionError::UnknownOption(name.to_string()),
                })
            }
        }
        Ok(())
    }

    /// Clamp every option into its valid range. Returns true if anything changed.
    ///
    /// Clamping is idempotent: checking already valid options leaves them unchanged.
    pub fn check(&mut self) -> bool {
        let before = self.clone();

        self.elements_count_up = self.elements_count_up.max(MIN_ELEMENTS_COUNT);
        self.elements_count_across = self.elements_count_across.max(MIN_ELEMENTS_COUNT);
        self.wall_thickness_left = clamp_wall_thickness(self.wall_thickness_left);
        self.wall_thickness_right = clamp_wall_thickness(self.wall_thickness_right);
        self.apex_scale_factor_identifier_offset = self.apex_scale_factor_identifier_offset.max(0);

        let changed = *self != before;
        if changed {
            for name in ORDERED_OPTION_NAMES {
                let (old, new) = (before.get(name), self.get(name));
                if old != new {
                    debug!(option = name, from = ?old, to = ?new, "clamped option");
                }
            }
        }
        changed
    }

    /// A clamped copy of these options
    pub fn checked(mut self) -> Self {
        self.check();
        self
    }

    /// Read options from a JSON object keyed by option name.
    ///
    /// Missing keys keep their default values; unknown keys are rejected.
    /// ```
    /// use sphere_shell_septum::options::MeshOptions;
    ///
    /// let options = MeshOptions::from_json(
    ///     &json::parse(r#"{ "Number of elements up": 6, "Wall thickness right": 0.1 }"#).unwrap(),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(options.elements_count_up, 6);
    /// assert_eq!(options.elements_count_across, 2);
    /// assert!((options.wall_thickness_right - 0.1).abs() < 1e-15);
    /// ```
    pub fn from_json(options_json: &JsonValue) -> Result<Self, OptionError> {
        if !options_json.is_object() {
            return Err(OptionError::Parse(String::from(
                "Options must be described by a JSON object!",
            )));
        }

        let mut options = Self::default();
        for (name, json_value) in options_json.entries() {
            let value = match (options.get(name), json_value.as_bool(), json_value.as_f64()) {
                (None, _, _) => return Err(OptionError::UnknownOption(name.to_string())),
                (Some(OptionValue::Boolean(_)), Some(b), _) => OptionValue::Boolean(b),
                (Some(OptionValue::Integer(_)), _, Some(n)) if n.fract() == 0.0 => {
                    OptionValue::Integer(n as i64)
                }
                (Some(OptionValue::Real(_)), _, Some(n)) => OptionValue::Real(n),
                (Some(current), _, _) => {
                    return Err(OptionError::WrongType {
                        name: name.to_string(),
                        expected: current.type_name(),
                        found: json_type_name(json_value),
                    })
                }
            };
            options.set(name, value)?;
        }

        Ok(options)
    }

    /// Read options from a JSON file (see [MeshOptions::from_json])
    pub fn from_file(path: impl AsRef<str>) -> Result<Self, OptionError> {
        let contents = read_to_string(path.as_ref())?;
        let options_json = json::parse(&contents).map_err(|e| OptionError::Parse(e.to_string()))?;
        Self::from_json(&options_json)
    }

    pub fn to_json(&self) -> JsonValue {
        object! {
            "Number of elements up": self.elements_count_up,
            "Number of elements across": self.elements_count_across,
            "Wall thickness left": self.wall_thickness_left,
            "Wall thickness right": self.wall_thickness_right,
            "Apex scale factor identifier offset": self.apex_scale_factor_identifier_offset,
            "Use cross derivatives": self.use_cross_derivatives,
        }
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    if value.is_boolean() {
        "boolean"
    } else if value.is_number() {
        "non-integer number"
    } else if value.is_string() {
        "string"
    } else {
        "structured"
    }
}

fn clamp_wall_thickness(thickness: f64) -> f64 {
    // NaN falls to the lower bound
    if !(thickness >= 0.0) {
        0.0
    } else if thickness > MAX_WALL_THICKNESS {
        MAX_WALL_THICKNESS
    } else {
        thickness
    }
}

#[derive(Debug)]
pub enum OptionError {
    UnknownOption(String),
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    Parse(String),
    Io(std::io::Error),
}

impl fmt::Display for OptionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownOption(name) => write!(f, "'{}' is not a recognized option!", name),
            Self::WrongType {
                name,
                expected,
                found,
            } => write!(
                f,
                "Option '{}' expects a {} value; found a {} value!",
                name, expected, found
            ),
            Self::Parse(msg) => write!(f, "Unable to parse options: {}", msg),
            Self::Io(err) => write!(f, "Unable to read options file: {}", err),
        }
    }
}

impl std::error::Error for OptionError {}

impl From<std::io::Error> for OptionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let mut options = MeshOptions::default();
        assert!(!options.check());
        assert_eq!(options, MeshOptions::default());
    }

    #[test]
    fn below_range_values_clamp_to_lower_bounds() {
        let mut options = MeshOptions {
            elements_count_up: 1,
            elements_count_across: -3,
            wall_thickness_left: -0.1,
            wall_thickness_right: f64::NAN,
            apex_scale_factor_identifier_offset: -5,
            use_cross_derivatives: false,
        };
        assert!(options.check());

        assert_eq!(options.elements_count_up, 2);
        assert_eq!(options.elements_count_across, 2);
        assert_eq!(options.wall_thickness_left, 0.0);
        assert_eq!(options.wall_thickness_right, 0.0);
        assert_eq!(options.apex_scale_factor_identifier_offset, 0);
    }

    #[test]
    fn thick_walls_clamp_to_half() {
        let options = MeshOptions {
            wall_thickness_left: 0.75,
            wall_thickness_right: 12.0,
            ..Default::default()
        }
        .checked();

        assert_eq!(options.wall_thickness_left, 0.5);
        assert_eq!(options.wall_thickness_right, 0.5);
    }

    #[test]
    fn get_and_set_by_name() {
        let mut options = MeshOptions::default();
        for name in ORDERED_OPTION_NAMES {
            assert!(options.get(name).is_some());
        }

        options
            .set(ELEMENTS_COUNT_ACROSS, OptionValue::Integer(5))
            .unwrap();
        options
            .set(WALL_THICKNESS_LEFT, OptionValue::Integer(0))
            .unwrap();
        options
            .set(USE_CROSS_DERIVATIVES, OptionValue::Boolean(true))
            .unwrap();

        assert_eq!(
            options.get(ELEMENTS_COUNT_ACROSS),
            Some(OptionValue::Integer(5))
        );
        assert_eq!(options.get(WALL_THICKNESS_LEFT), Some(OptionValue::Real(0.0)));
        assert!(options.use_cross_derivatives);
    }

    #[test]
    fn set_rejects_unknown_names_and_wrong_types() {
        let mut options = MeshOptions::default();

        assert!(matches!(
            options.set("Number of elements around", OptionValue::Integer(3)),
            Err(OptionError::UnknownOption(_))
        ));
        assert!(matches!(
            options.set(ELEMENTS_COUNT_UP, OptionValue::Real(3.5)),
            Err(OptionError::WrongType { .. })
        ));
        assert_eq!(options, MeshOptions::default());
    }

    #[test]
    fn json_round_trip() {
        let options = MeshOptions {
            elements_count_up: 7,
            elements_count_across: 3,
            wall_thickness_left: 0.3,
            wall_thickness_right: 0.1,
            apex_scale_factor_identifier_offset: 500,
            use_cross_derivatives: true,
        };

        let parsed = MeshOptions::from_json(&options.to_json()).unwrap();
        assert_eq!(parsed.elements_count_up, 7);
        assert_eq!(parsed.elements_count_across, 3);
        assert!((parsed.wall_thickness_left - 0.3).abs() < 1e-14);
        assert!((parsed.wall_thickness_right - 0.1).abs() < 1e-14);
        assert_eq!(parsed.apex_scale_factor_identifier_offset, 500);
        assert!(parsed.use_cross_derivatives);
    }

    #[test]
    fn options_from_file() {
        let assert_fixture = |options: &MeshOptions| {
            assert_eq!(options.elements_count_up, 6);
            assert_eq!(options.elements_count_across, 4);
            assert!((options.wall_thickness_left - 0.2).abs() < 1e-14);
            assert!((options.wall_thickness_right - 0.15).abs() < 1e-14);
            assert_eq!(options.apex_scale_factor_identifier_offset, 20000);
            assert!(options.use_cross_derivatives);
        };

        let options = MeshOptions::from_file("./test_input/asymmetric_options.json").unwrap();
        assert_fixture(&options);

        std::fs::create_dir_all("./test_output").unwrap();
        std::fs::write(
            "./test_output/asymmetric_options.json",
            options.to_json().pretty(4),
        )
        .unwrap();
        assert_fixture(&MeshOptions::from_file("./test_output/asymmetric_options.json").unwrap());

        assert!(matches!(
            MeshOptions::from_file("./test_input/missing_options.json"),
            Err(OptionError::Io(_))
        ));
    }

    #[test]
    fn whole_number_wall_thickness_in_json() {
        let options =
            MeshOptions::from_json(&json::parse(r#"{ "Wall thickness left": 0 }"#).unwrap())
                .unwrap();
        assert_eq!(options.wall_thickness_left, 0.0);
    }

    #[test]
    fn json_must_be_an_object() {
        assert!(matches!(
            MeshOptions::from_json(&json::parse("[1, 2]").unwrap()),
            Err(OptionError::Parse(_))
        ));
        assert!(matches!(
            MeshOptions::from_json(&json::parse(r#"{ "Number of elements up": "four" }"#).unwrap()),
            Err(OptionError::WrongType { .. })
        ));
        assert!(matches!(
            MeshOptions::from_json(&json::parse(r#"{ "Number of elements up": 2.5 }"#).unwrap()),
            Err(OptionError::WrongType { .. })
        ));
        assert!(matches!(
            MeshOptions::from_json(&json::parse(r#"{ "Elements around": 2 }"#).unwrap()),
            Err(OptionError::UnknownOption(_))
        ));
    }
}
