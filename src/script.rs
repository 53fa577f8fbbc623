//! # Scenario Scripts
//!
//! User-written scenarios in JSON. A script names objects by handle when it creates them and
//! addresses holders as either `variable` (a root) or `handle.field` (a field of a created object):
//!
//! ```json
//! { "name": "cycle", "steps": [
//!     { "op": "create", "label": "Dev 1", "id": "dev" },
//!     { "op": "setStrong", "holder": "dev1", "target": "dev" },
//!     { "op": "clear", "holder": "dev1" }
//! ] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::error::SimError;
use crate::runtime::{Holder, ObjectId};
use crate::scenarios::{ScenarioDriver, ScenarioReport};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid script: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Step {step}: unknown object handle '{handle}'")]
    UnknownHandle { step: usize, handle: String },

    #[error("Step {step}: object handle '{handle}' is already in use")]
    DuplicateHandle { step: usize, handle: String },

    #[error("Step {step}: malformed holder '{holder}'")]
    MalformedHolder { step: usize, holder: String },

    #[error(transparent)]
    Sim(#[from] SimError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    Create { label: String, id: String },
    SetStrong { holder: String, target: String },
    SetWeak { holder: String, target: String },
    SetUnowned { holder: String, target: String },
    ClearStrong { holder: String },
    Clear { holder: String },
    Read { holder: String },
    EndScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub steps: Vec<Step>,
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str(source)?)
    }
}

impl Script {
    pub fn from_path(path: &Path) -> Result<Self, ScriptError> {
        let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        source.parse()
    }

    /// Execute on the driver's heap. Malformed steps abort with an error; simulation failures
    /// such as dangling unowned reads end up in the report's outcome.
    pub fn run(&self, mut driver: ScenarioDriver) -> Result<ScenarioReport, ScriptError> {
        let mut handles = HashMap::new();
        let result = self
            .steps
            .iter()
            .enumerate()
            .try_for_each(|(index, step)| self.apply(&mut driver, &mut handles, index + 1, step));

        match result {
            Ok(()) => Ok(driver.finish(&self.name, Ok(()))),
            Err(ScriptError::Sim(error)) => Ok(driver.finish(&self.name, Err(error))),
            Err(other) => Err(other),
        }
    }

    fn apply(
        &self,
        driver: &mut ScenarioDriver,
        handles: &mut HashMap<String, ObjectId>,
        step: usize,
        op: &Step,
    ) -> Result<(), ScriptError> {
        debug!(script = %self.name, step, ?op, "applying step");
        match op {
            Step::Create { label, id } => {
                if handles.contains_key(id) {
                    return Err(ScriptError::DuplicateHandle { step, handle: id.clone() });
                }
                let object = driver.heap_mut().create(label.clone());
                handles.insert(id.clone(), object);
            }
            Step::SetStrong { holder, target } => {
                let (holder, target) = resolve_pair(handles, step, holder, target)?;
                driver.heap_mut().set_strong(holder, target)?;
            }
            Step::SetWeak { holder, target } => {
                let (holder, target) = resolve_pair(handles, step, holder, target)?;
                driver.heap_mut().set_weak(holder, target)?;
            }
            Step::SetUnowned { holder, target } => {
                let (holder, target) = resolve_pair(handles, step, holder, target)?;
                driver.heap_mut().set_unowned(holder, target)?;
            }
            Step::ClearStrong { holder } => {
                let holder = resolve_holder(handles, step, holder)?;
                driver.heap_mut().clear_strong(&holder)?;
            }
            Step::Clear { holder } => {
                let holder = resolve_holder(handles, step, holder)?;
                driver.heap_mut().clear(&holder)?;
            }
            Step::Read { holder: written } => {
                let holder = resolve_holder(handles, step, written)?;
                let seen = match driver.heap().read(&holder)? {
                    Some(target) => driver.heap().label(target)?.to_string(),
                    None => "nil".to_string(),
                };
                driver.note(format!("{} reads {}", written, seen));
            }
            Step::EndScope => driver.heap_mut().end_scope()?,
        }
        Ok(())
    }
}

fn resolve_handle(
    handles: &HashMap<String, ObjectId>,
    step: usize,
    handle: &str,
) -> Result<ObjectId, ScriptError> {
    handles
        .get(handle)
        .copied()
        .ok_or_else(|| ScriptError::UnknownHandle { step, handle: handle.to_string() })
}

fn resolve_holder(
    handles: &HashMap<String, ObjectId>,
    step: usize,
    holder: &str,
) -> Result<Holder, ScriptError> {
    let malformed = || ScriptError::MalformedHolder { step, holder: holder.to_string() };
    match holder.split_once('.') {
        None if holder.is_empty() => Err(malformed()),
        None => Ok(Holder::root(holder)),
        Some((handle, field)) => {
            if handle.is_empty() || field.is_empty() || field.contains('.') {
                return Err(malformed());
            }
            Ok(Holder::field(resolve_handle(handles, step, handle)?, field))
        }
    }
}

fn resolve_pair(
    handles: &HashMap<String, ObjectId>,
    step: usize,
    holder: &str,
    target: &str,
) -> Result<(Holder, ObjectId), ScriptError> {
    Ok((
        resolve_holder(handles, step, holder)?,
        resolve_handle(handles, step, target)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ScenarioKind;

    const BROKEN_CYCLE: &str = r#"{
        "name": "brokenCycleViaWeak",
        "steps": [
            { "op": "create", "label": "Dev 1", "id": "dev" },
            { "op": "create", "label": "Swift", "id": "tech" },
            { "op": "setStrong", "holder": "dev1", "target": "dev" },
            { "op": "setStrong", "holder": "tech1", "target": "tech" },
            { "op": "setStrong", "holder": "dev.languageNew", "target": "tech" },
            { "op": "setWeak", "holder": "tech.dev", "target": "dev" },
            { "op": "clearStrong", "holder": "dev1" },
            { "op": "read", "holder": "tech.dev" },
            { "op": "clearStrong", "holder": "tech1" }
        ]
    }"#;

    #[test]
    fn test_script_matches_builtin_trace() {
        let script: Script = BROKEN_CYCLE.parse().unwrap();
        let scripted = script.run(ScenarioDriver::new()).unwrap();
        let builtin = ScenarioDriver::new().run(ScenarioKind::BrokenCycleViaWeak);

        assert_eq!(scripted.events, builtin.events);
        assert_eq!(scripted.notes, vec!["tech.dev reads nil"]);
    }

    #[test]
    fn test_unknown_handle_aborts() {
        let script: Script = r#"{ "name": "bad", "steps": [
            { "op": "setStrong", "holder": "x", "target": "ghost" }
        ] }"#
            .parse()
            .unwrap();

        assert!(matches!(
            script.run(ScenarioDriver::new()),
            Err(ScriptError::UnknownHandle { step: 1, ref handle }) if handle == "ghost"
        ));
    }

    #[test]
    fn test_malformed_holder() {
        let script: Script = r#"{ "name": "bad", "steps": [
            { "op": "create", "label": "A", "id": "a" },
            { "op": "setStrong", "holder": "a.", "target": "a" }
        ] }"#
            .parse()
            .unwrap();

        assert!(matches!(
            script.run(ScenarioDriver::new()),
            Err(ScriptError::MalformedHolder { step: 2, .. })
        ));
    }

    #[test]
    fn test_dangling_read_is_reported_not_raised() {
        let script: Script = r#"{ "name": "dangling", "steps": [
            { "op": "create", "label": "Car", "id": "car" },
            { "op": "create", "label": "Model", "id": "model" },
            { "op": "setStrong", "holder": "car1", "target": "car" },
            { "op": "setStrong", "holder": "model1", "target": "model" },
            { "op": "setUnowned", "holder": "model.car", "target": "car" },
            { "op": "clear", "holder": "car1" },
            { "op": "read", "holder": "model.car" }
        ] }"#
            .parse()
            .unwrap();

        let report = script.run(ScenarioDriver::new()).unwrap();
        assert!(matches!(
            report.outcome.error(),
            Some(SimError::DanglingUnownedAccess { .. })
        ));
        assert_eq!(report.leaked, vec!["Model"]);
    }

    #[test]
    fn test_unknown_op_rejected() {
        let parsed = "{ \"name\": \"x\", \"steps\": [ { \"op\": \"collectCycles\" } ] }".parse::<Script>();
        assert!(matches!(parsed, Err(ScriptError::Json(_))));
    }
}
