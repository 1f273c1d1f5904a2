//! `rechnung`: invoice with line items.

use docverdict_contracts::{
    document::{alias_table, AliasTable, DocumentType},
    error::VerdictResult,
    rule::RuleKind,
    schema::{DType, FieldSpec, FieldSpecMap},
    value::Value,
    violation::Severity,
};

use super::{date_format, object, required, TYP_ALIASES};

pub const DOC_TYPE: &str = "rechnung";

pub fn schema() -> VerdictResult<FieldSpecMap> {
    let item = object(&[
        ("description", Value::from("Incubate collaborative eyeballs")),
        ("quantity", Value::Integer(2)),
        ("unit_price", Value::Float(40.61)),
        ("total", Value::Float(81.22)),
    ]);
    FieldSpecMap::from_fields(
        DOC_TYPE,
        [
            ("typ", FieldSpec::required(DType::String, DOC_TYPE, "Dokumenttyp")),
            ("sender", FieldSpec::required(DType::String, "Jäkel Martin e.V.", "Absender/Firma")),
            ("empfaenger", FieldSpec::required(DType::String, "Iwona Martin", "Empfänger")),
            ("rechnungsnummer", FieldSpec::required(DType::String, "RE-2026-1520", "Rechnungsnummer")),
            ("datum", FieldSpec::required(DType::String, "09.01.2026", "Rechnungsdatum")),
            (
                "items",
                FieldSpec::required(
                    DType::List,
                    Value::List(vec![item]),
                    "Positionen: Liste aus Objekten (description, quantity, unit_price, total)",
                ),
            ),
            ("total_net", FieldSpec::required(DType::Float, 929.74, "Nettosumme")),
            ("total_vat", FieldSpec::required(DType::Float, 176.65, "MwSt")),
            ("total_gross", FieldSpec::required(DType::Float, 1106.39, "Gesamtsumme (brutto)")),
        ],
    )
}

pub fn rules() -> Vec<RuleKind> {
    vec![
        required(&[
            "sender",
            "empfaenger",
            "rechnungsnummer",
            "datum",
            "items",
            "total_net",
            "total_vat",
            "total_gross",
        ]),
        date_format("datum", Severity::Error),
        RuleKind::ItemsStructure {
            field: "items".to_string(),
            item_keys: ["description", "quantity", "unit_price", "total"]
                .map(String::from)
                .to_vec(),
        },
        RuleKind::ItemTotals {
            field: "items".to_string(),
            quantity: "quantity".to_string(),
            unit_price: "unit_price".to_string(),
            total: "total".to_string(),
            tolerance: 0.02,
        },
        RuleKind::SumConsistency {
            parts: vec!["total_net".to_string(), "total_vat".to_string()],
            total: "total_gross".to_string(),
            tolerance: 0.02,
            require_all_parts: true,
            rule: "totals_mismatch".to_string(),
            severity: Severity::Error,
        },
    ]
}

pub fn aliases() -> AliasTable {
    alias_table(&[
        ("typ", TYP_ALIASES),
        ("sender", &["sender", "absender", "vendor", "issuer", "aussteller", "company", "firma"]),
        ("empfaenger", &["empfaenger", "empfänger", "recipient", "customer", "kunde", "client"]),
        (
            "rechnungsnummer",
            &["rechnungsnummer", "invoice_number", "invoice_no", "invoiceid", "rechnung_nr", "rechnungnummer"],
        ),
        ("datum", &["datum", "date", "invoice_date", "rechnungsdatum", "belegdatum"]),
        ("items", &["items", "positionen", "positions", "line_items", "lines"]),
        ("total_net", &["total_net", "netto", "subtotal", "sum_net", "net_amount", "total_ex_vat"]),
        ("total_vat", &["total_vat", "mwst", "vat", "tax", "tax_amount"]),
        ("total_gross", &["total_gross", "gesamt", "total", "gross", "grand_total", "total_inc_vat"]),
    ])
}

pub fn document_type() -> VerdictResult<DocumentType> {
    DocumentType::new(DOC_TYPE, "Rechnung", Some("INV"), schema()?, rules(), aliases())
}

#[cfg(test)]
mod tests {
    use docverdict_contracts::{
        value::{Record, Value},
        violation::Severity,
    };
    use docverdict_verify::{reconcile::force_schema_shape, RuleEngine};

    use super::document_type;

    fn engine_report(data: &Record) -> Vec<(String, String, Severity)> {
        let doc = document_type().unwrap();
        RuleEngine::new()
            .validate(data, &doc.rules)
            .violations
            .into_iter()
            .map(|v| (v.field, v.rule, v.severity))
            .collect()
    }

    #[test]
    fn example_record_passes_every_rule() {
        let example = document_type().unwrap().schema.example_record();
        assert!(engine_report(&example).is_empty());
    }

    #[test]
    fn gross_off_by_eleven_is_a_totals_mismatch() {
        let mut data = document_type().unwrap().schema.example_record();
        data.insert("total_net".to_string(), Value::Float(100.0));
        data.insert("total_vat".to_string(), Value::Float(19.0));
        data.insert("total_gross".to_string(), Value::Float(130.0));
        assert_eq!(
            engine_report(&data),
            [("total_gross".to_string(), "totals_mismatch".to_string(), Severity::Error)]
        );
    }

    #[test]
    fn english_keys_map_onto_the_schema() {
        let doc = document_type().unwrap();
        let raw: Record = [
            ("invoiceNumber", Value::from("RE-1")),
            ("Netto", Value::from("100,00")),
            ("grand_total", Value::from("119.00 EUR")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let shaped = force_schema_shape(&raw, &doc, 0.92);

        assert_eq!(shaped["rechnungsnummer"], Value::from("RE-1"));
        assert_eq!(shaped["total_net"], Value::Float(100.0));
        assert_eq!(shaped["total_gross"], Value::Float(119.0));
        assert_eq!(shaped["typ"], Value::from("rechnung"));
        assert_eq!(shaped["sender"], Value::Null);
    }
}
