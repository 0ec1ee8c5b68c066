use super::definition::Step;

/// A step reached during a pre-order walk of a plan.
#[derive(Debug, Clone)]
pub struct StepVisit<'a> {
    pub step: &'a Step,
    /// Locator such as `steps[1].cases[0].steps[2]`.
    pub path: String,
    /// Number of branches enclosing the step; top-level steps have depth 0.
    pub depth: usize,
    /// Set on a branch whose arms were not entered because they exceed the depth limit.
    pub truncated: bool,
}

/// Whether the arms of a branch sitting at `depth` lie beyond `max_depth`.
pub fn exceeds_depth(depth: usize, max_depth: usize) -> bool {
    depth + 1 > max_depth
}

pub fn step_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Visits every step in document order: each step before its nested steps,
/// a branch's cases in order and its `else` last.
///
/// Uses an explicit stack, so arbitrarily deep plans cannot exhaust the call stack.
pub fn walk(steps: &[Step], max_depth: usize) -> Vec<StepVisit<'_>> {
    let mut visits = Vec::new();
    let mut stack: Vec<(&Step, String, usize)> = steps
        .iter()
        .enumerate()
        .rev()
        .map(|(index, step)| (step, step_path("steps", index), 0))
        .collect();

    while let Some((step, path, depth)) = stack.pop() {
        let mut truncated = false;
        if let Step::Branch(branch) = step {
            if exceeds_depth(depth, max_depth) {
                truncated = true;
            } else {
                let mut children = Vec::new();
                for (case_index, case) in branch.cases.iter().enumerate() {
                    let case_path = format!("{}.cases[{}].steps", path, case_index);
                    for (index, child) in case.steps.iter().enumerate() {
                        children.push((child, step_path(&case_path, index), depth + 1));
                    }
                }
                if let Some(otherwise) = &branch.otherwise {
                    let else_path = format!("{}.else", path);
                    for (index, child) in otherwise.iter().enumerate() {
                        children.push((child, step_path(&else_path, index), depth + 1));
                    }
                }
                stack.extend(children.into_iter().rev());
            }
        }
        visits.push(StepVisit {
            step,
            path,
            depth,
            truncated,
        });
    }
    visits
}
