//! Parse input configuration file

use std::fmt;
use std::path::Path;
use thiserror::Error;
use yaml_rust::{YamlLoader, yaml::Yaml};
use meval::Context;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("invalid input file: {0}\nUsage: mpirun -n np ./vpdiag input-file")]
    InvalidInputFile(&'static str),
    #[error("unable to parse '{0}' = '{1}' in configuration file")]
    CouldNotParse(String, String),
    #[error("unable to find '{1}' in section '{0}' with correct type in configuration file")]
    MissingField(String, String),
}

/// Represents the input configuration, can be queried
/// for desired parameters
pub struct Configuration<'a> {
    input: Yaml,
    ctx: Context<'a>,
}

impl<'a> Configuration<'a> {
    pub fn from_file(path: &Path) -> Result<Configuration<'a>, InputError> {
        let contents = std::fs::read_to_string(path).map_err(|_e| InputError::InvalidInputFile("unable to read file"))?;
        Configuration::from_str(&contents)
    }

    pub fn from_str(contents: &str) -> Result<Configuration<'a>, InputError> {
        let input = YamlLoader::load_from_str(contents).map_err(|_e| InputError::InvalidInputFile("yaml trouble"))?;
        let input = input.first().ok_or(InputError::InvalidInputFile("yaml trouble"))?;
        Ok(Configuration {
            input: input.clone(),
            ctx: Context::new(),
        })
    }

    /// Loads the default functions, then the named constants in
    /// `section`. A constant may refer to those defined above it.
    pub fn with_context(&mut self, section: &str) -> &mut Self {
        self.ctx
            .func3("step", |x, min, max| if x >= min && x < max {1.0} else {0.0})
            .func3("gauss", |x, mu, sigma| (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp())
            .func2("maxwellian", |v, vth| (-v.powi(2) / (2.0 * vth.powi(2))).exp() / (2.0 * std::f64::consts::PI * vth.powi(2)).sqrt());

        if let Some(hash) = self.input[section].as_hash() {
            for (a, b) in hash {
                match (a, b) {
                    (Yaml::String(s), Yaml::Real(v)) => {
                        if let Ok(num) = v.parse::<f64>() {self.ctx.var(s, num);}
                    },
                    (Yaml::String(s), Yaml::Integer(i)) => {
                        self.ctx.var(s, *i as f64);
                    },
                    (Yaml::String(s), Yaml::String(v)) => {
                        if let Ok(expr) = v.parse::<meval::Expr>() {
                            if let Ok(num) = expr.eval_with_context(&self.ctx) {self.ctx.var(s, num);}
                        }
                    },
                    _ => ()
                }
            }
        }

        self
    }

    pub fn real(&self, section: &str, field: &str) -> Result<f64, InputError> {
        let name = field.to_owned();
        match &self.input[section][field] {
            Yaml::Real(s) => s.parse::<f64>().map_err(|_| InputError::CouldNotParse(name.clone(), s.clone())),
            Yaml::Integer(i) => Ok(*i as f64),
            Yaml::String(s) => {
                let expr = s.parse::<meval::Expr>().map_err(|_| InputError::CouldNotParse(name.clone(), s.clone()))?;
                expr.eval_with_context(&self.ctx).map_err(|_| InputError::CouldNotParse(name.clone(), s.clone()))
            },
            _ => Err(InputError::MissingField(section.to_owned(), name)),
        }
    }

    /// As `real`, but falls back to `default` if the field is absent.
    pub fn real_or(&self, section: &str, field: &str, default: f64) -> Result<f64, InputError> {
        match self.real(section, field) {
            Err(InputError::MissingField(..)) => Ok(default),
            other => other,
        }
    }

    pub fn func2(&'a self, section: &str, field: &str, args: [&str; 2]) -> Result<impl Fn(f64, f64) -> f64 + 'a, InputError> {
        match &self.input[section][field] {
            Yaml::String(s) | Yaml::Real(s) => {
                let expr = s.parse::<meval::Expr>().map_err(|_| InputError::CouldNotParse(field.to_owned(), s.clone()))?;
                expr.bind2_with_context(&self.ctx, args[0], args[1]).map_err(|_| InputError::CouldNotParse(field.to_owned(), s.clone()))
            },
            _ => Err(InputError::MissingField(section.to_owned(), field.to_owned()))
        }
    }

    pub fn integer(&self, section: &str, field: &str) -> Result<i64, InputError> {
        match &self.input[section][field] {
            Yaml::Integer(i) => Ok(*i),
            _ => Err(InputError::MissingField(section.to_owned(), field.to_owned())),
        }
    }

    /// As `integer`, but the value must be at least `min`, for sizes and counts.
    pub fn count(&self, section: &str, field: &str, min: i64) -> Result<usize, InputError> {
        let n = self.integer(section, field)?;
        if n < min {
            return Err(InputError::CouldNotParse(field.to_owned(), format!("{} (must be at least {})", n, min)));
        }
        Ok(n as usize)
    }

    pub fn bool(&self, section: &str, field: &str) -> Result<bool, InputError> {
        match &self.input[section][field] {
            Yaml::Boolean(b) => Ok(*b),
            _ => Err(InputError::MissingField(section.to_owned(), field.to_owned())),
        }
    }

    pub fn string(&self, section: &str, field: &str) -> Result<String, InputError> {
        match &self.input[section][field] {
            Yaml::String(s) => Ok(s.clone()),
            _ => Err(InputError::MissingField(section.to_owned(), field.to_owned())),
        }
    }

    /// As `string`, but falls back to `default` if the field is absent.
    pub fn string_or(&self, section: &str, field: &str, default: &str) -> String {
        self.string(section, field).unwrap_or_else(|_| default.to_owned())
    }
}

pub struct PrettyDuration {
    pub duration: std::time::Duration,
}

impl From<std::time::Duration> for PrettyDuration {
    fn from(duration: std::time::Duration) -> PrettyDuration {
        PrettyDuration {duration: duration}
    }
}

impl fmt::Display for PrettyDuration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut t = self.duration.as_secs();
        let s = t % 60;
        t /= 60;
        let min = t % 60;
        t /= 60;
        let hr = t % 24;
        let d = t / 24;
        if d > 0 {
            write!(f, "{}d {:02}:{:02}:{:02}", d, hr, min, s)
        } else {
            write!(f, "{:02}:{:02}:{:02}", hr, min, s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const INPUT: &str = "
control:
  nx: 65
  xmin: 0
  xmax: 2 * pi / k
  periodic: true

constants:
  k: 0.5
  eps: 0.01
  amplitude: 2 * eps

distribution:
  f0: (1 + amplitude * cos(k * x)) * maxwellian(v, 1.0)

output:
  rho: density
";

    #[test]
    fn reads_numbers_and_expressions() {
        let mut config = Configuration::from_str(INPUT).unwrap();
        config.with_context("constants");
        assert_eq!(config.integer("control", "nx").unwrap(), 65);
        assert_eq!(config.real("control", "xmin").unwrap(), 0.0);
        assert_relative_eq!(config.real("control", "xmax").unwrap(), 4.0 * std::f64::consts::PI);
        assert!(config.bool("control", "periodic").unwrap());
        assert_eq!(config.real_or("control", "end", 3.0).unwrap(), 3.0);
        assert_eq!(config.string_or("output", "rho", "rho"), "density");
        assert_eq!(config.string_or("output", "E", "E"), "E");
    }

    #[test]
    fn distribution_sees_constants() {
        let mut config = Configuration::from_str(INPUT).unwrap();
        config.with_context("constants");
        let f0 = config.func2("distribution", "f0", ["x", "v"]).unwrap();
        let peak = 1.0 / (2.0 * std::f64::consts::PI).sqrt();
        assert_relative_eq!(f0(0.0, 0.0), 1.02 * peak, epsilon = 1e-12);
        assert_relative_eq!(f0(2.0 * std::f64::consts::PI, 0.0), 0.98 * peak, epsilon = 1e-12);
    }

    #[test]
    fn missing_fields_are_named() {
        let config = Configuration::from_str(INPUT).unwrap();
        let err = config.integer("control", "nv").unwrap_err();
        assert!(format!("{}", err).contains("'nv' in section 'control'"));
        assert!(Configuration::from_str("a: [").is_err());
    }

    #[test]
    fn counts_must_reach_minimum() {
        let config = Configuration::from_str("control:\n  nx: -4\n  nv: 64\n  n_outputs: 0\n").unwrap();
        assert_eq!(config.count("control", "nv", 2).unwrap(), 64);
        match config.count("control", "nx", 2) {
            Err(InputError::CouldNotParse(field, value)) => {
                assert_eq!(field, "nx");
                assert!(value.starts_with("-4"));
            },
            other => panic!("expected a parse error, got {:?}", other),
        }
        assert!(matches!(config.count("control", "n_outputs", 1), Err(InputError::CouldNotParse(..))));
        assert!(matches!(config.count("control", "end", 1), Err(InputError::MissingField(..))));
    }

    #[test]
    fn durations_are_formatted() {
        let d: PrettyDuration = std::time::Duration::from_secs(93784).into();
        assert_eq!(format!("{}", d), "1d 02:03:04");
        let d: PrettyDuration = std::time::Duration::from_secs(61).into();
        assert_eq!(format!("{}", d), "00:01:01");
    }
}
