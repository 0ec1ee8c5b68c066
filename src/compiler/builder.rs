use super::synthesis::Synthesizer;
use super::{CompilerOptions, FilterRouting};
use crate::error::CompilerError;
use crate::plan::walk::{exceeds_depth, step_path};
use crate::plan::Step;
use crate::workflow::{
    Connection, Connections, FALSE_OUTPUT, MAIN_PORT, Node, TRUE_OUTPUT, case_output, node_id,
};

/// An output port still waiting for the node it should feed.
#[derive(Debug, Clone)]
struct OpenOutput {
    node: String,
    port: String,
}

impl OpenOutput {
    fn new(node: &str, port: impl Into<String>) -> Self {
        Self {
            node: node.to_string(),
            port: port.into(),
        }
    }
}

/// Flattens a step tree into nodes and connections.
///
/// Nodes live in an arena whose length is the next id, so ids follow emission order.
/// A branch's own node is emitted before anything inside it, which makes the
/// numbering a pre-order traversal of the plan.
pub(super) struct GraphBuilder<'a> {
    synthesizer: Synthesizer<'a>,
    options: &'a CompilerOptions,
    nodes: Vec<Node>,
    connections: Connections,
}

impl<'a> GraphBuilder<'a> {
    pub(super) fn new(synthesizer: Synthesizer<'a>, options: &'a CompilerOptions) -> Self {
        Self {
            synthesizer,
            options,
            nodes: Vec::new(),
            connections: Connections::new(),
        }
    }

    pub(super) fn build(mut self, steps: &[Step]) -> Result<(Vec<Node>, Connections), CompilerError> {
        self.sequence(steps, "steps", 0, Vec::new())?;
        if self.nodes.is_empty() {
            return Err(CompilerError::NoNodesGenerated);
        }
        Ok((self.nodes, self.connections))
    }

    /// Compiles `steps` one after another, feeding `open` into the first of them.
    /// Returns the outputs left dangling after the last step.
    fn sequence(
        &mut self,
        steps: &[Step],
        parent_path: &str,
        depth: usize,
        mut open: Vec<OpenOutput>,
    ) -> Result<Vec<OpenOutput>, CompilerError> {
        for (index, step) in steps.iter().enumerate() {
            open = self.step(step, &step_path(parent_path, index), depth, open)?;
        }
        Ok(open)
    }

    fn step(
        &mut self,
        step: &Step,
        path: &str,
        depth: usize,
        open: Vec<OpenOutput>,
    ) -> Result<Vec<OpenOutput>, CompilerError> {
        if step.is_trigger() && depth > 0 {
            return Err(CompilerError::UnsupportedStepType {
                step_type: step.type_name().to_string(),
                path: path.to_string(),
                step: Box::new(step.clone()),
            });
        }
        if matches!(step, Step::Branch(_)) && exceeds_depth(depth, self.options.max_depth) {
            return Err(CompilerError::NestingTooDeep {
                path: path.to_string(),
                max_depth: self.options.max_depth,
            });
        }

        let id = self.emit(step, path, open)?;

        let outputs = match step {
            Step::Filter(_) => match self.options.filter_routing {
                FilterRouting::Halt => vec![OpenOutput::new(&id, TRUE_OUTPUT)],
                FilterRouting::PassThrough => vec![
                    OpenOutput::new(&id, TRUE_OUTPUT),
                    OpenOutput::new(&id, FALSE_OUTPUT),
                ],
            },
            Step::Branch(branch) => {
                let mut outputs = Vec::new();
                for (index, case) in branch.cases.iter().enumerate() {
                    let arm = self.sequence(
                        &case.steps,
                        &format!("{}.cases[{}].steps", path, index),
                        depth + 1,
                        vec![OpenOutput::new(&id, case_output(index))],
                    )?;
                    outputs.extend(arm);
                }
                if let Some(otherwise) = &branch.otherwise {
                    let arm = self.sequence(
                        otherwise,
                        &format!("{}.else", path),
                        depth + 1,
                        vec![OpenOutput::new(&id, case_output(branch.cases.len()))],
                    )?;
                    outputs.extend(arm);
                }
                outputs
            }
            Step::TriggerHttp(_)
            | Step::SlackPostMessage(_)
            | Step::HttpRequest(_)
            | Step::CustomAction(_) => vec![OpenOutput::new(&id, MAIN_PORT)],
        };
        Ok(outputs)
    }

    /// Synthesizes the node for `step`, assigns it the next id and wires `open` into it.
    fn emit(
        &mut self,
        step: &Step,
        path: &str,
        open: Vec<OpenOutput>,
    ) -> Result<String, CompilerError> {
        let id = node_id(self.nodes.len());
        let node = self.synthesizer.synthesize(step, id.clone(), path)?;
        tracing::debug!(node = %node, path, "emitted node");

        for output in open {
            self.connections
                .add(Connection::new(&output.node, &output.port, &id));
        }
        self.nodes.push(node);
        Ok(id)
    }
}
