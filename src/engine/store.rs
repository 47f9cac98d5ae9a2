use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ulid::Ulid;

use crate::model::*;

type Index = Arc<HashMap<Ulid, Vec<Ulid>>>;

/// One immutable view of every collection. Each collection sits behind its own `Arc`, so building
/// the next snapshot copies only the collections a command touches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    users: Arc<BTreeMap<Ulid, User>>,
    projects: Arc<BTreeMap<Ulid, Project>>,
    tasks: Arc<BTreeMap<Ulid, Task>>,
    assignments: Arc<BTreeMap<Ulid, Assignment>>,
    time_off: Arc<BTreeMap<Ulid, TimeOff>>,
    /// Derived: user id → assignment ids, in booking order.
    user_assignments: Index,
    /// Derived: project id → assignment ids, in booking order.
    project_assignments: Index,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Users ────────────────────────────────────────────────

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn contains_user(&self, id: &Ulid) -> bool {
        self.users.contains_key(id)
    }

    /// Whether `id` names any stored entity.
    pub fn contains(&self, id: &Ulid) -> bool {
        self.users.contains_key(id)
            || self.projects.contains_key(id)
            || self.tasks.contains_key(id)
            || self.assignments.contains_key(id)
            || self.time_off.contains_key(id)
    }

    pub fn user(&self, id: &Ulid) -> Option<&User> {
        self.users.get(id)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    // ── Projects ─────────────────────────────────────────────

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn contains_project(&self, id: &Ulid) -> bool {
        self.projects.contains_key(id)
    }

    pub fn project(&self, id: &Ulid) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    // ── Tasks ────────────────────────────────────────────────

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn task(&self, id: &Ulid) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn project_tasks(&self, project_id: Ulid) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(move |t| t.project_id == project_id)
    }

    // ── Assignments ──────────────────────────────────────────

    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn assignment(&self, id: &Ulid) -> Option<&Assignment> {
        self.assignments.get(id)
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    /// The back-reference list for a user. Empty for unknown users.
    pub fn user_assignment_ids(&self, user_id: &Ulid) -> &[Ulid] {
        self.user_assignments
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn user_assignments(&self, user_id: Ulid) -> impl Iterator<Item = &Assignment> {
        self.user_assignment_ids(&user_id)
            .iter()
            .filter_map(move |id| self.assignments.get(id))
    }

    pub fn project_assignments(&self, project_id: Ulid) -> impl Iterator<Item = &Assignment> {
        self.project_assignments
            .get(&project_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(move |id| self.assignments.get(id))
    }

    pub fn task_assignments(&self, task_id: Ulid) -> impl Iterator<Item = &Assignment> {
        self.assignments
            .values()
            .filter(move |a| a.task_id == Some(task_id))
    }

    // ── Time off ─────────────────────────────────────────────

    pub fn time_off_count(&self) -> usize {
        self.time_off.len()
    }

    pub fn time_off(&self, id: &Ulid) -> Option<&TimeOff> {
        self.time_off.get(id)
    }

    pub fn user_time_off(&self, user_id: Ulid) -> impl Iterator<Item = &TimeOff> {
        self.time_off.values().filter(move |t| t.user_id == user_id)
    }

    // ── Event application ────────────────────────────────────

    /// The only mutation path. Callers validate first; `apply` assumes the event is legal
    /// against the current contents.
    pub(super) fn apply(&mut self, event: &Event) {
        match event {
            Event::UserAdded { user } | Event::UserUpdated { user } => {
                Arc::make_mut(&mut self.users).insert(user.id, user.clone());
            }
            Event::UserRemoved { id } => {
                Arc::make_mut(&mut self.users).remove(id);
                if self.user_assignments.contains_key(id) {
                    Arc::make_mut(&mut self.user_assignments).remove(id);
                }
            }
            Event::ProjectAdded { project } | Event::ProjectUpdated { project } => {
                Arc::make_mut(&mut self.projects).insert(project.id, project.clone());
            }
            Event::ProjectRemoved { id } => {
                Arc::make_mut(&mut self.projects).remove(id);
                if self.project_assignments.contains_key(id) {
                    Arc::make_mut(&mut self.project_assignments).remove(id);
                }
            }
            Event::TaskAdded { task } | Event::TaskUpdated { task } => {
                Arc::make_mut(&mut self.tasks).insert(task.id, task.clone());
            }
            Event::TaskRemoved { id, .. } => {
                Arc::make_mut(&mut self.tasks).remove(id);
            }
            Event::AssignmentAdded { assignment } => {
                Arc::make_mut(&mut self.assignments).insert(assignment.id, assignment.clone());
                link(&mut self.user_assignments, assignment.user_id, assignment.id);
                link(&mut self.project_assignments, assignment.project_id, assignment.id);
            }
            Event::AssignmentUpdated { assignment, .. } => {
                let previous = Arc::make_mut(&mut self.assignments)
                    .insert(assignment.id, assignment.clone());
                match previous {
                    Some(prev) => {
                        if prev.user_id != assignment.user_id {
                            unlink(&mut self.user_assignments, prev.user_id, assignment.id);
                            link(&mut self.user_assignments, assignment.user_id, assignment.id);
                        }
                        if prev.project_id != assignment.project_id {
                            unlink(&mut self.project_assignments, prev.project_id, assignment.id);
                            link(&mut self.project_assignments, assignment.project_id, assignment.id);
                        }
                    }
                    None => {
                        link(&mut self.user_assignments, assignment.user_id, assignment.id);
                        link(&mut self.project_assignments, assignment.project_id, assignment.id);
                    }
                }
            }
            Event::AssignmentRemoved { id, .. } => {
                if let Some(prev) = Arc::make_mut(&mut self.assignments).remove(id) {
                    unlink(&mut self.user_assignments, prev.user_id, prev.id);
                    unlink(&mut self.project_assignments, prev.project_id, prev.id);
                }
            }
            Event::TimeOffAdded { time_off } | Event::TimeOffUpdated { time_off } => {
                Arc::make_mut(&mut self.time_off).insert(time_off.id, time_off.clone());
            }
            Event::TimeOffRemoved { id, .. } => {
                Arc::make_mut(&mut self.time_off).remove(id);
            }
        }
    }

    /// Reference and index consistency. Returns the first violation found.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        for a in self.assignments.values() {
            if !self.users.contains_key(&a.user_id) {
                return Err(format!("assignment {} references missing user {}", a.id, a.user_id));
            }
            if !self.projects.contains_key(&a.project_id) {
                return Err(format!(
                    "assignment {} references missing project {}",
                    a.id, a.project_id
                ));
            }
            if let Some(tid) = a.task_id {
                match self.tasks.get(&tid) {
                    Some(t) if t.project_id == a.project_id => {}
                    _ => return Err(format!("assignment {} has bad task {tid}", a.id)),
                }
            }
            if a.range.start > a.range.end {
                return Err(format!("assignment {} has inverted range", a.id));
            }
        }
        for t in self.tasks.values() {
            if !self.projects.contains_key(&t.project_id) {
                return Err(format!("task {} references missing project", t.id));
            }
        }
        for t in self.time_off.values() {
            if !self.users.contains_key(&t.user_id) {
                return Err(format!("time off {} references missing user", t.id));
            }
        }
        for u in self.users.values() {
            let mut indexed: Vec<Ulid> = self.user_assignment_ids(&u.id).to_vec();
            let mut actual: Vec<Ulid> = self
                .assignments
                .values()
                .filter(|a| a.user_id == u.id)
                .map(|a| a.id)
                .collect();
            indexed.sort();
            actual.sort();
            if indexed != actual {
                return Err(format!("back-references of user {} out of sync", u.id));
            }
        }
        if self.user_assignments.keys().any(|k| !self.users.contains_key(k)) {
            return Err("index entry for a removed user".into());
        }
        for p in self.projects.values() {
            let mut indexed: Vec<Ulid> = self
                .project_assignments
                .get(&p.id)
                .cloned()
                .unwrap_or_default();
            let mut actual: Vec<Ulid> = self
                .assignments
                .values()
                .filter(|a| a.project_id == p.id)
                .map(|a| a.id)
                .collect();
            indexed.sort();
            actual.sort();
            if indexed != actual {
                return Err(format!("back-references of project {} out of sync", p.id));
            }
        }
        if self.project_assignments.keys().any(|k| !self.projects.contains_key(k)) {
            return Err("index entry for a removed project".into());
        }
        Ok(())
    }
}

fn link(index: &mut Index, key: Ulid, id: Ulid) {
    Arc::make_mut(index).entry(key).or_default().push(id);
}

fn unlink(index: &mut Index, key: Ulid, id: Ulid) {
    let map = Arc::make_mut(index);
    if let Some(ids) = map.get_mut(&key) {
        ids.retain(|i| *i != id);
        if ids.is_empty() {
            map.remove(&key);
        }
    }
}
