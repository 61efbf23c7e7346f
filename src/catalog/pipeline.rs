//! Option resolution, pre-submit transforms and dispatch for flow cards.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Map, Value};

use crate::config::Settings;
use crate::error::{CollaboratorError, FlowError, Result};
use crate::metrics::FlowMetrics;
use crate::policy::{create_policy_backend, PolicyBackend, RulePayload, RuleReceipt};
use crate::registry::{create_device_registry, DeviceRegistry};
use crate::template::{resolve_template, RenderMode, RenderOutput};

use super::client::resolve_client_value;
use super::schedule::{day_mask, days_to_num};
use super::types::{Card, CardKind, CardType, Flow, FlowInstance, OptionSource, ParamOption};
use super::get_card;

const CLIENT_PARAM: &str = "Client";

/// Runs flow cards against the device registry and policy backend.
///
/// Holds no state of its own besides the two collaborators, so one pipeline
/// can serve any number of concurrent callers.
#[derive(Clone)]
pub struct FlowPipeline {
    registry: Arc<dyn DeviceRegistry>,
    backend: Arc<dyn PolicyBackend>,
}

impl FlowPipeline {
    pub fn new(registry: Arc<dyn DeviceRegistry>, backend: Arc<dyn PolicyBackend>) -> Self {
        Self { registry, backend }
    }

    /// Build both collaborators from configuration.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            create_device_registry(&settings.devices),
            create_policy_backend(&settings.policy),
        )
    }

    /// Load `Settings` from files and environment, then build the pipeline.
    pub fn from_config() -> Result<Self> {
        let settings = Settings::new()?;
        Ok(Self::from_settings(&settings))
    }

    pub fn registry(&self) -> &Arc<dyn DeviceRegistry> {
        &self.registry
    }

    pub fn backend(&self) -> &Arc<dyn PolicyBackend> {
        &self.backend
    }

    /// Render an event template using this pipeline's device registry.
    pub fn render(&self, template: &str, event: Option<&Value>, mode: RenderMode) -> RenderOutput {
        resolve_template(self.registry.as_ref(), template, event, mode)
    }

    /// Choices for one parameter of a card.
    ///
    /// A failing collaborator call is returned as `FlowError::OptionFetch`,
    /// never as an empty list.
    pub async fn resolve_options(&self, card: &Card, param: &str) -> Result<Vec<ParamOption>> {
        let fetched: std::result::Result<Vec<ParamOption>, CollaboratorError> =
            match card.option_source(param) {
                OptionSource::None => Ok(Vec::new()),
                OptionSource::Static(options) => Ok(options),
                OptionSource::Groups => self
                    .registry
                    .list_groups()
                    .await
                    .map(|groups| groups.into_iter().map(ParamOption::same).collect())
                    .map_err(Into::into),
                OptionSource::Tags => self
                    .registry
                    .list_tags()
                    .await
                    .map(|tags| tags.into_iter().map(ParamOption::same).collect())
                    .map_err(Into::into),
                OptionSource::SiteVpns => self
                    .backend
                    .config()
                    .await
                    .map(|config| {
                        (0..config.site_vpns.len())
                            .map(|i| ParamOption::same(format!("site{}", i)))
                            .collect()
                    })
                    .map_err(Into::into),
            };

        FlowMetrics::record_options(fetched.is_ok());

        fetched.map_err(|source| {
            tracing::warn!(
                card = %card.title,
                param = %param,
                error = %source,
                "Failed to load card options"
            );
            FlowError::OptionFetch {
                card: card.title.to_string(),
                param: param.to_string(),
                source,
            }
        })
    }

    /// Resolve every visible parameter concurrently. Each parameter keeps its
    /// own result so one failing source does not hide the others.
    pub async fn resolve_all_options(
        &self,
        card: &Card,
    ) -> Vec<(&'static str, Result<Vec<ParamOption>>)> {
        let params: Vec<&'static str> = card.visible_params().map(|p| p.name).collect();
        let results = join_all(params.iter().map(|name| self.resolve_options(card, name))).await;
        params.into_iter().zip(results).collect()
    }

    /// Validate every provided value against its parameter spec.
    ///
    /// `Client` is judged by client resolution instead, which accepts
    /// canonical objects and whose failures some cards tolerate.
    fn validate(&self, card: &Card, values: &Map<String, Value>) -> Result<()> {
        for spec in card.params.iter().filter(|spec| spec.name != CLIENT_PARAM) {
            if let Some(value) = values.get(spec.name) {
                spec.validate(value)?;
            }
        }
        Ok(())
    }

    /// Normalize an instance's values into the payload for its card.
    ///
    /// The card and the instance are only read; the payload is a new map.
    pub async fn pre_submit(&self, card: &Card, instance: &FlowInstance) -> Result<RulePayload> {
        let values = card.effective_values(instance);

        match card.kind {
            CardKind::Always => Ok(time_payload(json!([]), "", "")),
            CardKind::Schedule => {
                self.validate(card, &values)?;
                let days = days_to_num(values.get("days").unwrap_or(&Value::Null))?;
                let start = values.get("from").and_then(Value::as_str).unwrap_or_default();
                let end = values.get("to").and_then(Value::as_str).unwrap_or_default();
                Ok(time_payload(json!(day_mask(&days)), start, end))
            }
            CardKind::IncomingRequest => Ok(values),
            kind => {
                self.validate(card, &values)?;
                let client = values.get(CLIENT_PARAM).unwrap_or(&Value::Null);
                let resolved = match resolve_client_value(self.registry.as_ref(), client).await {
                    Ok(client) => {
                        FlowMetrics::record_client("ok");
                        serde_json::to_value(client).map_err(|e| {
                            FlowError::Validation(format!("unserializable client: {}", e))
                        })?
                    }
                    Err(err) if kind.tolerates_client_failure() => {
                        FlowMetrics::record_client("tolerated");
                        tracing::warn!(
                            card = %card.title,
                            error = %err,
                            "Client did not resolve, submitting without one"
                        );
                        Value::String(String::new())
                    }
                    Err(err) => {
                        FlowMetrics::record_client("failed");
                        return Err(err);
                    }
                };

                let mut payload = values;
                payload.insert(CLIENT_PARAM.to_string(), resolved);
                Ok(payload)
            }
        }
    }

    /// Send a finished payload to the backend: update when `index` is set,
    /// create otherwise. Exactly one backend call, no retries.
    pub async fn dispatch(
        &self,
        card: &Card,
        payload: RulePayload,
        index: Option<usize>,
    ) -> Result<RuleReceipt> {
        let family = card
            .kind
            .family()
            .ok_or_else(|| FlowError::NotSubmittable(card.title.to_string()))?;

        let receipt = match index {
            Some(index) => self.backend.update_at(family, index, payload).await?,
            None => self.backend.create(family, payload).await?,
        };

        FlowMetrics::record_submission(family, receipt.operation);
        tracing::info!(
            card = %card.title,
            family = %family,
            index = receipt.index,
            operation = receipt.operation.as_str(),
            "Rule dispatched"
        );

        Ok(receipt)
    }

    /// Pre-submit then dispatch a single card instance.
    pub async fn submit_flow(&self, card: &Card, instance: &FlowInstance) -> Result<RuleReceipt> {
        let result = self.try_submit(card, instance).await;
        if let Err(err) = &result {
            FlowMetrics::record_failure(err.stage());
            tracing::warn!(card = %card.title, error = %err, "Flow submission failed");
        }
        result
    }

    async fn try_submit(&self, card: &Card, instance: &FlowInstance) -> Result<RuleReceipt> {
        if instance.title != card.title || instance.card_type != card.card_type {
            return Err(FlowError::Validation(format!(
                "instance of '{}' cannot be submitted through '{}'",
                instance.title, card.title
            )));
        }
        if card.kind.family().is_none() {
            return Err(FlowError::NotSubmittable(card.title.to_string()));
        }

        let payload = self.pre_submit(card, instance).await?;
        self.dispatch(card, payload, instance.index).await
    }

    /// Save a whole flow as one rule: trigger and action payloads merged
    /// under the flow's name, dispatched through the action card.
    pub async fn save_flow(&self, flow: &Flow) -> Result<RuleReceipt> {
        let result = self.try_save(flow).await;
        if let Err(err) = &result {
            FlowMetrics::record_failure(err.stage());
            tracing::warn!(flow = %flow.title, error = %err, "Saving flow failed");
        }
        result
    }

    async fn try_save(&self, flow: &Flow) -> Result<RuleReceipt> {
        let trigger = lookup(CardType::Trigger, &flow.trigger)?;
        let action = lookup(CardType::Action, &flow.action)?;

        let mut payload = RulePayload::new();
        payload.insert("RuleName".to_string(), json!(flow.title));
        payload.insert("Disabled".to_string(), json!(flow.disabled));
        payload.extend(self.pre_submit(trigger, &flow.trigger).await?);
        payload.extend(self.pre_submit(action, &flow.action).await?);

        self.dispatch(action, payload, flow.index).await
    }
}

fn lookup(card_type: CardType, instance: &FlowInstance) -> Result<&'static Card> {
    if instance.card_type != card_type {
        return Err(FlowError::Validation(format!(
            "'{}' is not a {} card",
            instance.title, card_type
        )));
    }
    get_card(card_type, &instance.title).ok_or_else(|| FlowError::UnknownCard {
        card_type: card_type.to_string(),
        title: instance.title.clone(),
    })
}

fn time_payload(days: Value, start: &str, end: &str) -> RulePayload {
    let mut payload = RulePayload::new();
    payload.insert(
        "Time".to_string(),
        json!({ "Days": days, "Start": start, "End": end }),
    );
    payload.insert("Condition".to_string(), json!(""));
    payload
}
