//! System scheduling and dependency management
//!
//! Systems run sequentially. Within a phase the order is a topological sort
//! of the declared dependencies, with registration order breaking ties, so
//! the same set of systems always runs in the same order.

use std::collections::HashMap;

use thiserror::Error;

use super::system::{System, SystemError, SystemPhase};
use super::World;

/// Scheduling errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Two systems share a name
    #[error("A system named '{0}' is already registered")]
    DuplicateSystem(String),

    /// A dependency names no system in the same phase
    #[error("System '{system}' depends on unknown system '{dependency}' in phase {phase:?}")]
    UnknownDependency {
        /// Dependent system
        system: String,
        /// Missing dependency
        dependency: String,
        /// Phase searched
        phase: SystemPhase,
    },

    /// Dependencies form a cycle
    #[error("Circular dependency among systems {systems:?} in phase {phase:?}")]
    Cycle {
        /// Systems that could not be ordered
        systems: Vec<String>,
        /// Phase of the cycle
        phase: SystemPhase,
    },
}

/// System scheduler
#[derive(Default)]
pub struct SystemScheduler {
    systems: Vec<Box<dyn System>>,
    plan: HashMap<SystemPhase, Vec<usize>>,
    dirty: bool,
}

impl SystemScheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system to the scheduler
    pub fn add_system(&mut self, system: Box<dyn System>) -> Result<(), ScheduleError> {
        if self.systems.iter().any(|s| s.name() == system.name()) {
            return Err(ScheduleError::DuplicateSystem(system.name().to_string()));
        }
        log::debug!("Registered system '{}' in {:?}", system.name(), system.phase());
        self.systems.push(system);
        self.dirty = true;
        Ok(())
    }

    /// Remove a system by name
    pub fn remove_system(&mut self, name: &str) -> Option<Box<dyn System>> {
        let index = self.systems.iter().position(|s| s.name() == name)?;
        self.dirty = true;
        Some(self.systems.remove(index))
    }

    /// Number of registered systems
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Whether no system is registered
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Build the execution plan from the current systems
    pub fn build_plan(&mut self) -> Result<(), ScheduleError> {
        let mut plan = HashMap::new();
        for phase in SystemPhase::ALL {
            plan.insert(phase, self.order_phase(phase)?);
        }
        self.plan = plan;
        self.dirty = false;
        Ok(())
    }

    fn order_phase(&self, phase: SystemPhase) -> Result<Vec<usize>, ScheduleError> {
        let members: Vec<usize> = (0..self.systems.len())
            .filter(|&i| self.systems[i].phase() == phase)
            .collect();

        let index_of: HashMap<&str, usize> = members.iter().map(|&i| (self.systems[i].name(), i)).collect();

        let mut pending_deps: HashMap<usize, Vec<usize>> = HashMap::new();
        for &i in &members {
            let system = &self.systems[i];
            let mut deps = Vec::new();
            for dependency in system.dependencies() {
                let Some(&dep) = index_of.get(dependency) else {
                    return Err(ScheduleError::UnknownDependency {
                        system: system.name().to_string(),
                        dependency: (*dependency).to_string(),
                        phase,
                    });
                };
                deps.push(dep);
            }
            pending_deps.insert(i, deps);
        }

        // Kahn's algorithm; picking the lowest ready index keeps registration order
        let mut order = Vec::with_capacity(members.len());
        let mut remaining = members;
        while !remaining.is_empty() {
            let ready = remaining
                .iter()
                .position(|i| pending_deps[i].iter().all(|dep| order.contains(dep)));
            let Some(position) = ready else {
                return Err(ScheduleError::Cycle {
                    systems: remaining.iter().map(|&i| self.systems[i].name().to_string()).collect(),
                    phase,
                });
            };
            order.push(remaining.remove(position));
        }
        Ok(order)
    }

    /// Names of the systems in a phase, in execution order
    pub fn execution_order(&mut self, phase: SystemPhase) -> Result<Vec<String>, ScheduleError> {
        self.ensure_plan()?;
        Ok(self.plan[&phase].iter().map(|&i| self.systems[i].name().to_string()).collect())
    }

    fn ensure_plan(&mut self) -> Result<(), ScheduleError> {
        if self.dirty || self.plan.is_empty() {
            self.build_plan()?;
        }
        Ok(())
    }

    /// Run every system in a phase
    pub fn run_phase(&mut self, phase: SystemPhase, world: &mut World, delta_time: f32) -> Result<(), ScheduleRunError> {
        self.ensure_plan()?;
        let order = self.plan.get(&phase).cloned().unwrap_or_default();
        for index in order {
            let system = &mut self.systems[index];
            log::trace!("Running system '{}'", system.name());
            system.run(world, delta_time)?;
        }
        Ok(())
    }

    /// Run all phases in order
    pub fn run_all(&mut self, world: &mut World, delta_time: f32) -> Result<(), ScheduleRunError> {
        for phase in SystemPhase::ALL {
            self.run_phase(phase, world, delta_time)?;
        }
        Ok(())
    }
}

/// Failure while running scheduled systems
#[derive(Error, Debug)]
pub enum ScheduleRunError {
    /// The plan could not be built
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// A system returned an error
    #[error(transparent)]
    System(#[from] SystemError),
}
