//! Built-in plan modifiers

use crate::schema::{PlanModifier, PlanModifierRequest, PlanModifierResponse};
use crate::types::Dynamic;

fn unchanged(request: PlanModifierRequest) -> PlanModifierResponse {
    PlanModifierResponse {
        plan_value: request.plan_value,
        requires_replace: false,
        diagnostics: Vec::new(),
    }
}

/// Forces replacement whenever the planned value differs from state.
pub struct RequiresReplace;

impl RequiresReplace {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "If the value of this attribute changes, Terraform will destroy and recreate the resource."
            .to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let state = &request.state_value.value;
        let plan = &request.plan_value.value;
        // Unknown plans are decided at apply time; a missing state means create.
        let requires_replace = !state.is_null()
            && !state.is_unknown()
            && !plan.is_unknown()
            && !values_equal(state, plan);

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics: Vec::new(),
        }
    }
}

/// Like [`RequiresReplace`] but gated on a predicate over the request.
pub struct RequiresReplaceIf<F>
where
    F: Fn(&PlanModifierRequest) -> bool + Send + Sync,
{
    predicate: F,
    description: String,
}

impl<F> RequiresReplaceIf<F>
where
    F: Fn(&PlanModifierRequest) -> bool + Send + Sync + 'static,
{
    pub fn create(predicate: F, description: impl Into<String>) -> Box<dyn PlanModifier> {
        Box::new(Self {
            predicate,
            description: description.into(),
        })
    }
}

impl<F> PlanModifier for RequiresReplaceIf<F>
where
    F: Fn(&PlanModifierRequest) -> bool + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let wanted = (self.predicate)(&request);
        let mut response = RequiresReplace.modify(request);
        response.requires_replace &= wanted;
        response
    }
}

/// Copies the prior state value into an unknown plan value.
pub struct UseStateForUnknown;

impl UseStateForUnknown {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "Once set, the value of this attribute in state will not change.".to_string()
    }

    fn modify(&self, mut request: PlanModifierRequest) -> PlanModifierResponse {
        let keep_state = request.plan_value.is_unknown()
            && !request.state_value.is_null()
            && request.config_value.is_null();
        if keep_state {
            request.plan_value = request.state_value.clone();
        }
        unchanged(request)
    }
}

/// Structural equality that treats numbers within EPSILON as equal
pub fn values_equal(a: &Dynamic, b: &Dynamic) -> bool {
    match (a, b) {
        (Dynamic::Number(a), Dynamic::Number(b)) => (a - b).abs() < f64::EPSILON,
        (Dynamic::List(a), Dynamic::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Dynamic::Map(a), Dynamic::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|v2| values_equal(v, v2)))
        }
        _ => a == b,
    }
}
