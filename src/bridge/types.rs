use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bridge::transform::{self, PreSerialize};

/// Body of a bridge request.
///
/// Serialized without a tag: the bridge tells the two apart by the presence of
/// `topic` or `procedure`.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallPayload {
    Publish {
        topic: String,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    },
    Call {
        procedure: String,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    },
}

impl CallPayload {
    #[must_use]
    pub fn publish<S: Into<String>>(
        topic: S,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Self {
        CallPayload::Publish {
            topic: topic.into(),
            args,
            kwargs,
        }
    }

    #[must_use]
    pub fn call<S: Into<String>>(
        procedure: S,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Self {
        CallPayload::Call {
            procedure: procedure.into(),
            args,
            kwargs,
        }
    }

    /// Topic or procedure URI this payload targets.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            CallPayload::Publish { topic, .. } => topic,
            CallPayload::Call { procedure, .. } => procedure,
        }
    }

    /// Returns a copy with every leaf of `args` and `kwargs` passed through `hook`.
    #[must_use]
    pub fn transformed(&self, hook: &dyn PreSerialize) -> Self {
        let mut payload = self.clone();
        let (CallPayload::Publish { args, kwargs, .. } | CallPayload::Call { args, kwargs, .. }) =
            &mut payload;

        for arg in args.iter_mut() {
            transform::apply_in_place(hook, arg);
        }
        for value in kwargs.values_mut() {
            transform::apply_in_place(hook, value);
        }

        payload
    }
}
