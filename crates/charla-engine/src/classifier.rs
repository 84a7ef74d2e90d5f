// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic message classifier.
//!
//! Three independent facets computed from one message: intent (ordered regex
//! table, first match wins), sentiment (weighted lexicons plus emoji,
//! normalized to `[-1, 1]`), and urgency. Total functions: absence of signal
//! maps to `General` / `0.0` / `Low`, never to a missing value.
//!
//! The rule tables cover the Spanish and English commerce vocabulary the
//! platform sees in practice. A learned classifier can later implement
//! [`Classifier`] without touching the routing pipeline.

use std::sync::LazyLock;

use regex::Regex;

use charla_core::types::{ClassificationResult, Intent, SentimentLabel, Urgency};

/// Message classification seam.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> ClassificationResult;
}

/// The rule-table classifier used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleClassifier;

impl Classifier for RuleClassifier {
    fn classify(&self, text: &str) -> ClassificationResult {
        classify(text)
    }
}

// Detection order is significant: a message mentioning both price and
// purchase ("cuanto cuesta, lo compro") classifies as pricing.
static INTENT_TABLE: LazyLock<Vec<(Regex, Intent)>> = LazyLock::new(|| {
    let table: [(&str, Intent); 10] = [
        (
            r"(?i)\b(precio|precios|costo|coste|tarifa|cu[aá]nto\s+(cuesta|vale|sale)|price|cost|how\s+much)\b",
            Intent::Pricing,
        ),
        (
            r"(?i)\b(comprar|compra|lo\s+llevo|lo\s+compro|adquirir|pedido|pedir|buy|purchase|order)\b",
            Intent::Purchase,
        ),
        (
            r"(?i)\b(disponible|disponibilidad|stock|tienen|quedan|queda|hay\s+de|available|in\s+stock)\b",
            Intent::Availability,
        ),
        (
            r"(?i)\b(informaci[oó]n|detalles|caracter[ií]sticas|especificaciones|info|details|tell\s+me\s+more)\b",
            Intent::Information,
        ),
        (
            r"(?i)\b(cita|citas|agendar|agenda|reservar|reserva|turno|horario|appointment|schedule|booking|book)\b",
            Intent::Appointment,
        ),
        (
            r"(?i)\b(ayuda|problema|no\s+funciona|soporte|reclamo|queja|falla|help|support|issue|broken)\b",
            Intent::Support,
        ),
        (
            r"(?i)\b(comparar|comparaci[oó]n|diferencia|versus|vs|mejor\s+que|cu[aá]l\s+es\s+mejor|compare|difference)\b",
            Intent::Comparison,
        ),
        (
            r"(?i)\b(env[ií]o|env[ií]os|entrega|domicilio|cu[aá]ndo\s+llega|shipping|delivery)\b",
            Intent::Shipping,
        ),
        (
            r"(?i)\b(garant[ií]a|devoluci[oó]n|devolver|cambio\s+de\s+producto|warranty|guarantee|refund|return)\b",
            Intent::Warranty,
        ),
        (
            r"(?i)\b(descuento|oferta|promoci[oó]n|promo|rebaja|cup[oó]n|discount|coupon|deal)\b",
            Intent::Discount,
        ),
    ];
    table
        .into_iter()
        .map(|(pattern, intent)| (compile(pattern), intent))
        .collect()
});

// Signed weights; negation patterns outweigh the positive phrase they
// contain so "no me gusta" nets negative even though "me gusta" also fires.
static SENTIMENT_TABLE: LazyLock<Vec<(Regex, f32)>> = LazyLock::new(|| {
    let table: [(&str, f32); 16] = [
        (r"(?i)\b(excelente|perfecto|incre[ií]ble|genial|excellent|perfect|amazing|great)\b", 2.0),
        (r"(?i)\bme\s+(gusta|encanta|interesa)\b", 2.0),
        (r"(?i)\bno\s+me\s+(gusta|encanta|interesa|convence)\b", -4.0),
        (r"(?i)\b(gracias|thanks|thank\s+you)\b", 1.0),
        (r"(?i)\b(bueno|buena|bien|good|nice)\b", 1.0),
        (r"(?i)\b(recomendado|recomiendo|recommend)\b", 1.5),
        (r"(?i)\b(feliz|contento|contenta|happy)\b", 1.5),
        (r"(?i)\b(malo|mala|mal|bad)\b", -1.0),
        (r"(?i)\b(terrible|horrible|p[eé]simo|p[eé]sima|awful)\b", -2.0),
        (r"(?i)\b(caro|cara|car[ií]simo|expensive|overpriced)\b", -1.0),
        (r"(?i)\b(decepci[oó]n|decepcionado|decepcionada|disappointed)\b", -2.0),
        (r"(?i)\b(enojado|enojada|molesto|molesta|angry|upset)\b", -2.0),
        (r"(?i)\b(estafa|fraude|scam|fraud)\b", -2.5),
        (r"[😊😁😃🙂😍🥰👍❤🎉✨]", 2.0),
        (r"[🤔😐😑]", 0.0),
        (r"[😡😠😞😢👎💔🤬]", -2.0),
    ];
    table
        .into_iter()
        .map(|(pattern, weight)| (compile(pattern), weight))
        .collect()
});

// (pattern, is high-weight term). Any high-weight hit, or two hits of any
// kind, tips urgency to High.
static URGENCY_TABLE: LazyLock<Vec<(Regex, bool)>> = LazyLock::new(|| {
    let table: [(&str, bool); 8] = [
        (r"(?i)\b(urgente|urgent|emergencia|emergency)\b", true),
        (r"(?i)\b(inmediatamente|immediately|asap|ya\s+mismo)\b", true),
        (r"(?i)\b(cuanto\s+antes|lo\s+antes\s+posible)\b", true),
        (r"(?i)\b(hoy\s+mismo|hoy)\b", false),
        (r"(?i)\b(ahora|right\s+now)\b", false),
        (r"(?i)\b(r[aá]pido|r[aá]pida|quick|fast)\b", false),
        (r"(?i)\b(pronto|soon)\b", false),
        (r"(?i)\bya\b", false),
    ];
    table
        .into_iter()
        .map(|(pattern, high)| (compile(pattern), high))
        .collect()
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("fixed classifier pattern must compile")
}

/// Classifies one message. Total: never fails, never returns an undefined
/// category.
pub fn classify(text: &str) -> ClassificationResult {
    let (sentiment, sentiment_label) = sentiment(text);
    ClassificationResult {
        intent: intent(text),
        sentiment,
        sentiment_label,
        urgency: urgency(text),
    }
}

/// First matching category in the fixed table; `General` otherwise.
pub fn intent(text: &str) -> Intent {
    INTENT_TABLE
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, intent)| *intent)
        .unwrap_or(Intent::General)
}

/// Normalized sentiment score and its discrete label.
///
/// `raw = Σ(weight × hits)` over firing patterns, divided by
/// `Σ(|weight| × hits)`, clamped to `[-1, 1]`; `0.0` when nothing fires.
pub fn sentiment(text: &str) -> (f32, SentimentLabel) {
    let mut raw = 0.0f32;
    let mut magnitude = 0.0f32;
    for (pattern, weight) in SENTIMENT_TABLE.iter() {
        let hits = pattern.find_iter(text).count() as f32;
        if hits > 0.0 {
            raw += weight * hits;
            magnitude += weight.abs() * hits;
        }
    }
    let score = if magnitude > 0.0 {
        (raw / magnitude).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let label = if score > 0.2 {
        SentimentLabel::Positive
    } else if score < -0.2 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };
    (score, label)
}

/// Urgency tier from the urgency lexicon.
///
/// Hits are counted per occurrence, so repeating one term escalates the
/// same way as mixing distinct terms.
pub fn urgency(text: &str) -> Urgency {
    let mut hits = 0usize;
    let mut any_high = false;
    for (pattern, high) in URGENCY_TABLE.iter() {
        let count = pattern.find_iter(text).count();
        if count > 0 {
            hits += count;
            any_high |= high;
        }
    }
    if any_high || hits >= 2 {
        Urgency::High
    } else if hits == 1 {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}
