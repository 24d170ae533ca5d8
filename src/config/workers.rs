use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteFlowError};

/// Closed set of workers the supervisor can route to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerId {
    StructuredAgent,
    UnstructuredAgent,
    ResponseAgent,
}

impl WorkerId {
    pub const ALL: [WorkerId; 3] = [
        WorkerId::StructuredAgent,
        WorkerId::UnstructuredAgent,
        WorkerId::ResponseAgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerId::StructuredAgent => "structured_agent",
            WorkerId::UnstructuredAgent => "unstructured_agent",
            WorkerId::ResponseAgent => "response_agent",
        }
    }

    /// Display label used in `<name>...</name>` prefixes.
    pub fn label(&self) -> &'static str {
        match self {
            WorkerId::StructuredAgent => "Structured Agent",
            WorkerId::UnstructuredAgent => "Unstructured Agent",
            WorkerId::ResponseAgent => "Response Agent",
        }
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerId {
    type Err = RouteFlowError;

    fn from_str(value: &str) -> Result<Self> {
        WorkerId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == value)
            .ok_or_else(|| RouteFlowError::UnknownWorker(value.to_string()))
    }
}

/// The worker set fixed at startup. Order follows configuration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerRoster {
    workers: Vec<WorkerId>,
}

impl WorkerRoster {
    /// Builds the roster from configured agent names. `supervisor` is skipped;
    /// any other name must map to a known worker. The response worker is
    /// mandatory because it is the only non-limit exit.
    pub fn from_names<'a, I>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut workers = Vec::new();
        for name in names {
            if name == SUPERVISOR {
                continue;
            }
            let id = WorkerId::from_str(name)?;
            if workers.contains(&id) {
                return Err(RouteFlowError::Config(format!(
                    "worker `{name}` configured twice"
                )));
            }
            workers.push(id);
        }
        if !workers.contains(&WorkerId::ResponseAgent) {
            return Err(RouteFlowError::Config(
                "roster must include `response_agent`".to_string(),
            ));
        }
        Ok(Self { workers })
    }

    pub fn contains(&self, id: WorkerId) -> bool {
        self.workers.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.workers.iter().copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.workers.iter().map(|id| id.as_str()).collect()
    }

    /// Strict lookup used on classifier output: the value must name a worker
    /// in this roster, nothing else is accepted.
    pub fn resolve(&self, value: &str) -> Result<WorkerId> {
        let id = WorkerId::from_str(value).map_err(|_| {
            RouteFlowError::ClassifierContract(format!(
                "`{value}` is not one of {:?}",
                self.names()
            ))
        })?;
        if !self.contains(id) {
            return Err(RouteFlowError::ClassifierContract(format!(
                "`{value}` is not registered in this roster"
            )));
        }
        Ok(id)
    }
}

pub const SUPERVISOR: &str = "supervisor";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_skips_supervisor_and_keeps_order() {
        let roster =
            WorkerRoster::from_names(["supervisor", "unstructured_agent", "response_agent"])
                .unwrap();
        assert_eq!(roster.names(), vec!["unstructured_agent", "response_agent"]);
    }

    #[test]
    fn roster_rejects_unknown_worker() {
        let err = WorkerRoster::from_names(["response_agent", "genie"]).unwrap_err();
        assert!(matches!(err, RouteFlowError::UnknownWorker(name) if name == "genie"));
    }

    #[test]
    fn roster_requires_response_worker() {
        assert!(WorkerRoster::from_names(["structured_agent"]).is_err());
    }

    #[test]
    fn resolve_fails_closed() {
        let roster = WorkerRoster::from_names(["response_agent"]).unwrap();
        assert!(roster.resolve("response_agent").is_ok());
        assert!(matches!(
            roster.resolve("structured_agent"),
            Err(RouteFlowError::ClassifierContract(_))
        ));
        assert!(matches!(
            roster.resolve("Response Agent"),
            Err(RouteFlowError::ClassifierContract(_))
        ));
    }
}
