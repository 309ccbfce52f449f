//! Finite-domain constraint model and reference backend.
//!
//! The exact-refinement stage expresses its problem as a [`CpModel`]:
//! integer variables with explicit finite domains, all-different and
//! pairwise inequality constraints, windowed at-most-count constraints,
//! and an optional maximization objective. Any backend implementing
//! [`CpSolver`] may solve the model; [`SimpleCpSolver`] is the
//! self-contained reference implementation — chronological backtracking
//! with a most-constrained-first variable order and a wall-clock budget.
//!
//! Backends must never panic on hard instances: they return
//! [`SolveStatus::Unknown`] when the budget expires without a solution
//! and [`SolveStatus::Infeasible`] when the search space is exhausted.

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Variable handle within a [`CpModel`].
pub type VarId = usize;

/// An integer decision variable with an explicit finite domain.
#[derive(Debug, Clone)]
pub struct IntVar {
    /// Diagnostic name.
    pub name: String,
    /// Candidate values, ascending.
    pub domain: Vec<i32>,
}

/// A constraint over model variables.
#[derive(Debug, Clone)]
pub enum CpConstraint {
    /// All listed variables take pairwise distinct values.
    AllDifferent(Vec<VarId>),
    /// The two variables take distinct values.
    NotEqual(VarId, VarId),
    /// At most `limit` of `vars` may take a value from `values`.
    AtMostWithin {
        vars: Vec<VarId>,
        values: Vec<i32>,
        limit: u32,
    },
}

/// A term of the (maximized) linear objective.
#[derive(Debug, Clone)]
pub enum ObjectiveTerm {
    /// Adds `weight` when both variables take the same value.
    EqualityBonus { a: VarId, b: VarId, weight: i64 },
    /// Adds `weight × max(0, count − threshold)` where `count` is how
    /// many of `vars` take a value from `values`. Penalties use a
    /// negative weight.
    ExcessPenalty {
        vars: Vec<VarId>,
        values: Vec<i32>,
        threshold: u32,
        weight: i64,
    },
}

/// A constraint satisfaction model.
#[derive(Debug, Clone)]
pub struct CpModel {
    name: String,
    vars: Vec<IntVar>,
    constraints: Vec<CpConstraint>,
    objective: Vec<ObjectiveTerm>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            constraints: Vec::new(),
            objective: Vec::new(),
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a variable with the given domain and returns its handle.
    pub fn add_var(&mut self, name: impl Into<String>, mut domain: Vec<i32>) -> VarId {
        domain.sort_unstable();
        domain.dedup();
        self.vars.push(IntVar {
            name: name.into(),
            domain,
        });
        self.vars.len() - 1
    }

    /// Adds an all-different constraint.
    pub fn add_all_different(&mut self, vars: Vec<VarId>) {
        if vars.len() > 1 {
            self.constraints.push(CpConstraint::AllDifferent(vars));
        }
    }

    /// Adds a pairwise inequality constraint.
    pub fn add_not_equal(&mut self, a: VarId, b: VarId) {
        self.constraints.push(CpConstraint::NotEqual(a, b));
    }

    /// Adds a windowed at-most-count constraint.
    pub fn add_at_most_within(&mut self, vars: Vec<VarId>, values: Vec<i32>, limit: u32) {
        self.constraints.push(CpConstraint::AtMostWithin {
            vars,
            values,
            limit,
        });
    }

    /// Adds an equality bonus to the objective.
    pub fn add_equality_bonus(&mut self, a: VarId, b: VarId, weight: i64) {
        self.objective
            .push(ObjectiveTerm::EqualityBonus { a, b, weight });
    }

    /// Adds an excess penalty to the objective.
    pub fn add_excess_penalty(
        &mut self,
        vars: Vec<VarId>,
        values: Vec<i32>,
        threshold: u32,
        weight: i64,
    ) {
        self.objective.push(ObjectiveTerm::ExcessPenalty {
            vars,
            values,
            threshold,
            weight,
        });
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Whether any objective term is present.
    pub fn has_objective(&self) -> bool {
        !self.objective.is_empty()
    }

    /// The variable's domain.
    pub fn domain(&self, var: VarId) -> &[i32] {
        &self.vars[var].domain
    }
}

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock budget for the search.
    pub time_limit: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
        }
    }
}

/// Outcome classification of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The returned assignment is best possible: the search space was
    /// exhausted, or the model has no objective and any solution is final.
    Optimal,
    /// A solution was found but optimality is unproven (budget expired).
    Feasible,
    /// Search space exhausted without any solution.
    Infeasible,
    /// Budget expired before any solution was found.
    Unknown,
}

/// Result of a solve call.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Outcome classification.
    pub status: SolveStatus,
    /// Per-variable values; `None` when no solution was found.
    pub values: Vec<Option<i32>>,
    /// Objective value of the returned assignment.
    pub objective: i64,
}

impl CpSolution {
    /// Whether a usable assignment is present.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    /// The value assigned to a variable, if any.
    pub fn value(&self, var: VarId) -> Option<i32> {
        self.values.get(var).copied().flatten()
    }
}

/// A backend capable of solving a [`CpModel`].
pub trait CpSolver {
    /// Solves the model within the configured budget.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

/// Chronological-backtracking reference backend.
///
/// Orders variables most-constrained-first (smallest domain), checks
/// consistency incrementally against the constraints touching the
/// assigned variable, and enumerates solutions under the wall-clock
/// budget. With an objective it keeps searching for better assignments
/// until the budget or the search space runs out.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleCpSolver;

impl SimpleCpSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for SimpleCpSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let n = model.vars.len();
        if model.vars.iter().any(|v| v.domain.is_empty()) {
            return CpSolution {
                status: SolveStatus::Infeasible,
                values: vec![None; n],
                objective: 0,
            };
        }

        let mut order: Vec<VarId> = (0..n).collect();
        order.sort_by_key(|&v| model.vars[v].domain.len());

        // Constraint indices touching each variable.
        let mut touching: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (ci, constraint) in model.constraints.iter().enumerate() {
            match constraint {
                CpConstraint::AllDifferent(vars) | CpConstraint::AtMostWithin { vars, .. } => {
                    for &v in vars {
                        touching[v].push(ci);
                    }
                }
                CpConstraint::NotEqual(a, b) => {
                    touching[*a].push(ci);
                    touching[*b].push(ci);
                }
            }
        }

        let value_sets: Vec<Option<HashSet<i32>>> = model
            .constraints
            .iter()
            .map(|c| match c {
                CpConstraint::AtMostWithin { values, .. } => {
                    Some(values.iter().copied().collect())
                }
                _ => None,
            })
            .collect();

        let mut search = Search {
            model,
            order,
            touching,
            value_sets,
            assignment: vec![None; n],
            best: None,
            best_objective: i64::MIN,
            deadline: Instant::now() + config.time_limit,
            nodes: 0,
            out_of_budget: false,
        };
        search.dfs(0);

        let exhausted = !search.out_of_budget;
        match search.best {
            Some(values) => CpSolution {
                status: if exhausted {
                    SolveStatus::Optimal
                } else {
                    SolveStatus::Feasible
                },
                values: values.into_iter().map(Some).collect(),
                objective: search.best_objective,
            },
            None => CpSolution {
                status: if exhausted {
                    SolveStatus::Infeasible
                } else {
                    SolveStatus::Unknown
                },
                values: vec![None; n],
                objective: 0,
            },
        }
    }
}

struct Search<'m> {
    model: &'m CpModel,
    order: Vec<VarId>,
    touching: Vec<Vec<usize>>,
    value_sets: Vec<Option<HashSet<i32>>>,
    assignment: Vec<Option<i32>>,
    best: Option<Vec<i32>>,
    best_objective: i64,
    deadline: Instant,
    nodes: u64,
    out_of_budget: bool,
}

impl Search<'_> {
    /// Returns `true` when the search must stop (budget expired, or the
    /// first solution of an objective-free model was recorded).
    fn dfs(&mut self, depth: usize) -> bool {
        if self.check_budget() {
            return true;
        }
        if depth == self.order.len() {
            let objective = self.evaluate_objective();
            if self.best.is_none() || objective > self.best_objective {
                self.best = Some(self.assignment.iter().map(|v| v.unwrap()).collect());
                self.best_objective = objective;
            }
            // Without an objective any solution is final; with one, the
            // enumeration continues for better assignments.
            return !self.model.has_objective();
        }

        let var = self.order[depth];
        for i in 0..self.model.vars[var].domain.len() {
            let value = self.model.vars[var].domain[i];
            self.assignment[var] = Some(value);
            if self.consistent(var) && self.dfs(depth + 1) {
                self.assignment[var] = None;
                return true;
            }
            self.assignment[var] = None;
        }
        false
    }

    fn check_budget(&mut self) -> bool {
        if self.nodes % 256 == 0 && Instant::now() >= self.deadline {
            self.out_of_budget = true;
        }
        self.nodes += 1;
        self.out_of_budget
    }

    fn consistent(&self, var: VarId) -> bool {
        let value = self.assignment[var].unwrap();
        for &ci in &self.touching[var] {
            match &self.model.constraints[ci] {
                CpConstraint::AllDifferent(vars) => {
                    let clash = vars
                        .iter()
                        .any(|&v| v != var && self.assignment[v] == Some(value));
                    if clash {
                        return false;
                    }
                }
                CpConstraint::NotEqual(a, b) => {
                    let other = if *a == var { *b } else { *a };
                    if self.assignment[other] == Some(value) {
                        return false;
                    }
                }
                CpConstraint::AtMostWithin { vars, limit, .. } => {
                    let set = self.value_sets[ci].as_ref().unwrap();
                    let count = vars
                        .iter()
                        .filter(|&&v| matches!(self.assignment[v], Some(x) if set.contains(&x)))
                        .count();
                    if count > *limit as usize {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn evaluate_objective(&self) -> i64 {
        self.model
            .objective
            .iter()
            .map(|term| match term {
                ObjectiveTerm::EqualityBonus { a, b, weight } => {
                    if self.assignment[*a] == self.assignment[*b] {
                        *weight
                    } else {
                        0
                    }
                }
                ObjectiveTerm::ExcessPenalty {
                    vars,
                    values,
                    threshold,
                    weight,
                } => {
                    let count = vars
                        .iter()
                        .filter(|&&v| {
                            matches!(self.assignment[v], Some(x) if values.contains(&x))
                        })
                        .count() as i64;
                    weight * (count - *threshold as i64).max(0)
                }
            })
            .sum()
    }
}
