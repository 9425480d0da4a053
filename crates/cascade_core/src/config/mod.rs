use std::collections::HashMap;
use std::sync::LazyLock;

use cascade_error::{CascadeError, ErrorKind, Result};

use crate::values::Value;

pub const DEFAULT_CHUNK_SIZE: usize = 65536;

const MIN_CHUNK_SIZE: usize = 1;
const MAX_CHUNK_SIZE: usize = 1 << 24;

const MIN_THREADS: usize = 1;
const MAX_THREADS: usize = 512;

/// Configuration for an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Chunk size used when creating vectors.
    pub chunk_size: usize,
    /// Number of worker threads for a threaded runtime.
    pub threads: usize,
    /// If chunks should be processed on a thread pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: num_cpus::get(),
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn set_from_value(&mut self, name: &str, value: &Value) -> Result<()> {
        let func = lookup_setting(name)?;
        (func.set)(value, self)
    }

    pub fn get_as_value(&self, name: &str) -> Result<Value> {
        let func = lookup_setting(name)?;
        Ok((func.get)(self))
    }

    /// Reset a single setting to its default.
    pub fn reset(&mut self, name: &str) -> Result<()> {
        let def_conf = Self::default();
        let func = lookup_setting(name)?;

        let value = (func.get)(&def_conf);
        (func.set)(&value, self)
    }

    /// Names and descriptions of every setting.
    pub fn settings() -> impl Iterator<Item = (&'static str, &'static str)> {
        let mut settings: Vec<_> = GET_SET_FUNCTIONS
            .iter()
            .map(|(name, funcs)| (*name, funcs.description))
            .collect();
        settings.sort_unstable();
        settings.into_iter()
    }
}

fn lookup_setting(name: &str) -> Result<&'static SettingFunctions> {
    GET_SET_FUNCTIONS.get(name).ok_or_else(|| {
        CascadeError::with_kind(ErrorKind::Config, format!("Missing setting for '{name}'"))
    })
}

struct SettingFunctions {
    description: &'static str,
    set: fn(value: &Value, conf: &mut EngineConfig) -> Result<()>,
    get: fn(conf: &EngineConfig) -> Value,
}

impl SettingFunctions {
    const fn new<S: EngineSetting>() -> Self {
        SettingFunctions {
            description: S::DESCRIPTION,
            set: S::set_from_value as _,
            get: S::get_as_value as _,
        }
    }
}

fn insert_setting<S: EngineSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<ChunkSize>(&mut map);
    insert_setting::<Threads>(&mut map);
    insert_setting::<Parallel>(&mut map);

    map
});

pub trait EngineSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_value(value: &Value, conf: &mut EngineConfig) -> Result<()>;
    fn get_as_value(conf: &EngineConfig) -> Value;
}

/// Read a setting value as a non-negative integer within some bounds.
fn value_as_usize_in(name: &str, value: &Value, min: usize, max: usize) -> Result<usize> {
    let v = value
        .try_as_number()
        .map_err(|e| e.with_field("setting", name))?;

    if v.fract() != 0.0 || v < min as f64 || v > max as f64 {
        return Err(CascadeError::with_kind(
            ErrorKind::Config,
            format!("Setting '{name}' must be an integer between {min} and {max}"),
        )
        .with_field("value", v));
    }

    Ok(v as usize)
}

pub struct ChunkSize;

impl EngineSetting for ChunkSize {
    const NAME: &'static str = "chunk_size";
    const DESCRIPTION: &'static str = "Number of elements per chunk for new vectors";

    fn set_from_value(value: &Value, conf: &mut EngineConfig) -> Result<()> {
        conf.chunk_size = value_as_usize_in(Self::NAME, value, MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)?;
        Ok(())
    }

    fn get_as_value(conf: &EngineConfig) -> Value {
        Value::Number(conf.chunk_size as f64)
    }
}

pub struct Threads;

impl EngineSetting for Threads {
    const NAME: &'static str = "threads";
    const DESCRIPTION: &'static str = "Number of worker threads when running in parallel";

    fn set_from_value(value: &Value, conf: &mut EngineConfig) -> Result<()> {
        conf.threads = value_as_usize_in(Self::NAME, value, MIN_THREADS, MAX_THREADS)?;
        Ok(())
    }

    fn get_as_value(conf: &EngineConfig) -> Value {
        Value::Number(conf.threads as f64)
    }
}

pub struct Parallel;

impl EngineSetting for Parallel {
    const NAME: &'static str = "parallel";
    const DESCRIPTION: &'static str = "Process chunks on a thread pool (1) or inline (0)";

    fn set_from_value(value: &Value, conf: &mut EngineConfig) -> Result<()> {
        conf.parallel = value_as_usize_in(Self::NAME, value, 0, 1)? == 1;
        Ok(())
    }

    fn get_as_value(conf: &EngineConfig) -> Value {
        Value::Number(if conf.parallel { 1.0 } else { 0.0 })
    }
}
