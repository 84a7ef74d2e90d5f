// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response policy: funnel stage + matched entity + classification → reply.
//!
//! Template buckets are keyed by (stage, product resolved?). Product
//! templates interpolate name, price, and a description slice; product-absent
//! templates fall back to the tenant's configured objective. A personality
//! pass then adjusts tone. The output is never empty: a fixed greeting is the
//! last resort.

use charla_core::types::{
    BotObjective, ClassificationResult, FunnelStage, Product, SentimentLabel, TenantConfig,
};
use charla_scheduling::SlotOutcome;

const GENERIC_GREETING: &str = "Hola, gracias por escribirnos. ¿En qué podemos ayudarte?";

/// Longest description slice interpolated into a template.
const DESCRIPTION_SLICE: usize = 120;

/// Stateless reply composer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponsePolicy;

impl ResponsePolicy {
    pub fn new() -> Self {
        Self
    }

    /// Composes the reply for one routed message.
    ///
    /// `slot_outcome` carries slot engine results when the intent was
    /// appointment-related; suggested times are embedded in the reply.
    pub fn compose(
        &self,
        tenant: &TenantConfig,
        product: Option<&Product>,
        result: &ClassificationResult,
        stage: FunnelStage,
        slot_outcome: Option<&SlotOutcome>,
    ) -> String {
        let mut reply = match product {
            Some(p) => product_template(p, stage),
            None => objective_template(tenant.objective),
        };

        // An upset contact gets an apology ahead of any sales copy.
        if result.sentiment_label == SentimentLabel::Negative {
            reply = format!("Lamento que hayas tenido una mala experiencia. {reply}");
        }

        if let Some(outcome) = slot_outcome {
            if !reply.is_empty() {
                reply.push(' ');
            }
            reply.push_str(&slot_suggestion(outcome));
        }

        let reply = apply_personality(&tenant.personality, reply);
        if reply.trim().is_empty() {
            GENERIC_GREETING.to_string()
        } else {
            reply
        }
    }
}

fn product_template(product: &Product, stage: FunnelStage) -> String {
    let name = &product.name;
    let price = product.price;
    let about = description_slice(&product.description);
    match stage {
        FunnelStage::Attention => {
            format!("¡Hola! Te cuento sobre {name}: {about}")
        }
        FunnelStage::Interest => format!(
            "{name} cuesta ${price:.2}. {about} ¿Quieres que te cuente más?"
        ),
        FunnelStage::Desire => format!(
            "{name} es una gran elección: {about} Por ${price:.2} es de lo mejor que tenemos. ¿Te lo aparto?"
        ),
        FunnelStage::Action => format!(
            "¡Excelente decisión! Para confirmar tu compra de {name} (${price:.2}) pásame tu nombre y dirección de entrega."
        ),
        FunnelStage::Retention => format!(
            "¡Gracias por tu compra de {name}! Cuéntame qué tal te fue y avísame si necesitas algo más."
        ),
    }
}

fn objective_template(objective: BotObjective) -> String {
    match objective {
        BotObjective::Sales => {
            "¡Hola! Tenemos varios productos disponibles. Cuéntame qué buscas y te paso opciones y precios.".to_string()
        }
        BotObjective::Appointments => {
            "¡Hola! ¿Quieres agendar una cita? Dime qué día y hora te acomodan.".to_string()
        }
        BotObjective::Support => {
            "¡Hola! Cuéntame qué problema tienes y lo resolvemos juntos.".to_string()
        }
    }
}

fn slot_suggestion(outcome: &SlotOutcome) -> String {
    match outcome {
        SlotOutcome::Found(slot) => format!(
            "Tengo disponible el {} a las {}. ¿Te lo reservo?",
            slot.date.format("%d/%m"),
            slot.time.format("%H:%M"),
        ),
        SlotOutcome::Unavailable {
            reason,
            alternatives,
        } => {
            let mut text = format!("{reason}.");
            if !alternatives.is_empty() {
                let listed: Vec<String> = alternatives
                    .iter()
                    .take(3)
                    .map(|s| {
                        format!("{} {}", s.date.format("%d/%m"), s.time.format("%H:%M"))
                    })
                    .collect();
                text.push_str(&format!(
                    " Te puedo ofrecer: {}. ¿Alguna te sirve?",
                    listed.join(", ")
                ));
            }
            text
        }
    }
}

fn description_slice(description: &str) -> String {
    let first = description.split('.').next().unwrap_or(description).trim();
    let mut slice: String = first.chars().take(DESCRIPTION_SLICE).collect();
    if !slice.is_empty() && !slice.ends_with('.') {
        slice.push('.');
    }
    slice
}

fn apply_personality(personality: &str, reply: String) -> String {
    let personality = personality.to_lowercase();
    if personality.contains("formal") {
        // Formal: no exclamations, formal address.
        reply
            .replace(['¡', '!'], "")
            .replace("Te cuento", "Le cuento")
            .replace("Cuéntame", "Cuénteme")
            .replace("tu compra", "su compra")
            .replace("¿Quieres", "¿Desea")
            .replace("¿Te", "¿Le")
            .trim()
            .to_string()
    } else if personality.contains("casual")
        || personality.contains("friendly")
        || personality.contains("amigable")
    {
        format!("{reply} 😊\n¡Escríbeme si necesitas algo más!")
    } else {
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charla_core::types::{Intent, SentimentLabel, Urgency};
    use charla_test_utils::{product, tenant};
    use chrono::{NaiveDate, NaiveTime};

    fn classification() -> ClassificationResult {
        ClassificationResult {
            intent: Intent::General,
            sentiment: 0.0,
            sentiment_label: SentimentLabel::Neutral,
            urgency: Urgency::Low,
        }
    }

    fn neutral_tenant(objective: BotObjective) -> TenantConfig {
        let mut t = tenant("t1", &[]);
        t.objective = objective;
        t.personality = "neutro".to_string();
        t
    }

    #[test]
    fn product_templates_interpolate_name_and_price() {
        let policy = ResponsePolicy::new();
        let t = neutral_tenant(BotObjective::Sales);
        let p = product("p1", "Keratina Premium", "belleza", &[]);
        for stage in [
            FunnelStage::Attention,
            FunnelStage::Interest,
            FunnelStage::Desire,
            FunnelStage::Action,
            FunnelStage::Retention,
        ] {
            let reply = policy.compose(&t, Some(&p), &classification(), stage, None);
            assert!(reply.contains("Keratina Premium"), "{stage}: {reply}");
            assert!(!reply.trim().is_empty());
        }
        let action = policy.compose(&t, Some(&p), &classification(), FunnelStage::Action, None);
        assert!(action.contains("$25.00"));
    }

    #[test]
    fn objective_fallback_without_product() {
        let policy = ResponsePolicy::new();
        let sales = policy.compose(
            &neutral_tenant(BotObjective::Sales),
            None,
            &classification(),
            FunnelStage::Attention,
            None,
        );
        assert!(sales.contains("productos"));

        let appointments = policy.compose(
            &neutral_tenant(BotObjective::Appointments),
            None,
            &classification(),
            FunnelStage::Attention,
            None,
        );
        assert!(appointments.contains("cita"));

        let support = policy.compose(
            &neutral_tenant(BotObjective::Support),
            None,
            &classification(),
            FunnelStage::Attention,
            None,
        );
        assert!(support.contains("problema"));
    }

    #[test]
    fn casual_personality_appends_emoji_and_closing() {
        let policy = ResponsePolicy::new();
        let mut t = neutral_tenant(BotObjective::Sales);
        t.personality = "casual".to_string();
        let reply = policy.compose(&t, None, &classification(), FunnelStage::Attention, None);
        assert!(reply.contains("😊"));
        assert!(reply.contains("Escríbeme"));
    }

    #[test]
    fn formal_personality_strips_exclamations() {
        let policy = ResponsePolicy::new();
        let mut t = neutral_tenant(BotObjective::Sales);
        t.personality = "formal".to_string();
        let reply = policy.compose(&t, None, &classification(), FunnelStage::Attention, None);
        assert!(!reply.contains('!'));
        assert!(!reply.contains('¡'));
        assert!(!reply.trim().is_empty());
    }

    #[test]
    fn found_slot_is_embedded() {
        let policy = ResponsePolicy::new();
        let t = neutral_tenant(BotObjective::Appointments);
        let outcome = SlotOutcome::Found(charla_core::types::AppointmentSlot {
            date: NaiveDate::from_ymd_opt(2026, 3, 4).expect("valid date"),
            time: NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
            duration_minutes: 60,
            available: true,
            score: 70,
        });
        let reply = policy.compose(
            &t,
            None,
            &classification(),
            FunnelStage::Interest,
            Some(&outcome),
        );
        assert!(reply.contains("04/03"));
        assert!(reply.contains("10:00"));
    }

    #[test]
    fn unavailable_outcome_lists_alternatives() {
        let policy = ResponsePolicy::new();
        let t = neutral_tenant(BotObjective::Appointments);
        let outcome = SlotOutcome::Unavailable {
            reason: "no hay horarios libres ese día".to_string(),
            alternatives: vec![charla_core::types::AppointmentSlot {
                date: NaiveDate::from_ymd_opt(2026, 3, 5).expect("valid date"),
                time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
                duration_minutes: 60,
                available: true,
                score: 35,
            }],
        };
        let reply = policy.compose(
            &t,
            None,
            &classification(),
            FunnelStage::Interest,
            Some(&outcome),
        );
        assert!(reply.contains("no hay horarios libres"));
        assert!(reply.contains("05/03 09:00"));
    }

    #[test]
    fn negative_sentiment_gets_an_apology_first() {
        let policy = ResponsePolicy::new();
        let t = neutral_tenant(BotObjective::Support);
        let mut c = classification();
        c.sentiment = -0.8;
        c.sentiment_label = SentimentLabel::Negative;
        let reply = policy.compose(&t, None, &c, FunnelStage::Interest, None);
        assert!(reply.starts_with("Lamento"));
    }

    #[test]
    fn output_is_never_empty() {
        let policy = ResponsePolicy::new();
        let mut t = neutral_tenant(BotObjective::Support);
        t.personality = String::new();
        let reply = policy.compose(&t, None, &classification(), FunnelStage::Retention, None);
        assert!(!reply.trim().is_empty());
    }
}
