//! Text bodies for outgoing email and documents, rendered with Tera

use chrono::Utc;
use rust_embed::Embed;
use serde::Serialize;
use tera::Tera;
use thiserror::Error;

use crate::entities::{BillOfMaterials, PurchaseOrder, Vendor};

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const PO_EMAIL: &str = "po_email.txt.tera";
const BOM_DOC: &str = "bom_doc.txt.tera";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

#[derive(Serialize)]
struct LineView {
    sku: String,
    name: String,
    quantity: String,
    unit_price: String,
    total: String,
}

fn num(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

pub struct TemplateGenerator {
    tera: Tera,
}

impl TemplateGenerator {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    fn has(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Email body asking a vendor to fill a purchase order
    pub fn po_email(
        &self,
        po: &PurchaseOrder,
        vendor: &Vendor,
        currency: &str,
        author: &str,
    ) -> Result<String, TemplateError> {
        let lines: Vec<LineView> = po
            .lines
            .iter()
            .map(|l| LineView {
                sku: l.sku.clone(),
                name: l.name.clone(),
                quantity: num(l.quantity),
                unit_price: format!("{:.2}", l.unit_price),
                total: format!("{:.2}", l.total()),
            })
            .collect();

        let mut context = tera::Context::new();
        context.insert("order_number", &po.order_number);
        context.insert("vendor_name", &vendor.name);
        context.insert(
            "expected_date",
            &po.expected_date.map(|d| d.format("%Y-%m-%d").to_string()),
        );
        context.insert("lines", &lines);
        context.insert("total", &format!("{:.2}", po.total()));
        context.insert("currency", currency);
        context.insert("notes", &po.notes);
        context.insert("author", author);

        if self.has(PO_EMAIL) {
            self.tera
                .render(PO_EMAIL, &context)
                .map_err(|e| TemplateError::RenderError(e.to_string()))
        } else {
            let mut out = format!(
                "Please find purchase order {} for {} below.\n\n",
                po.order_number, vendor.name
            );
            for l in &lines {
                out.push_str(&format!(
                    "- {}  {}  x {} @ {} = {}\n",
                    l.sku, l.name, l.quantity, l.unit_price, l.total
                ));
            }
            out.push_str(&format!("\nOrder total: {:.2} {}\n\n{}\n", po.total(), currency, author));
            Ok(out)
        }
    }

    /// Plain-text rendering of a BOM for a shared document
    pub fn bom_doc(&self, bom: &BillOfMaterials) -> Result<String, TemplateError> {
        #[derive(Serialize)]
        struct ComponentView<'a> {
            sku: &'a str,
            name: &'a str,
            quantity: String,
            unit: &'a str,
        }

        let components: Vec<ComponentView> = bom
            .components
            .iter()
            .map(|c| ComponentView {
                sku: &c.sku,
                name: &c.name,
                quantity: num(c.quantity),
                unit: &c.unit,
            })
            .collect();

        let mut context = tera::Context::new();
        context.insert("name", &bom.name);
        context.insert("finished_sku", &bom.finished_sku);
        context.insert("yield_quantity", &num(bom.yield_quantity));
        context.insert("generated", &Utc::now().format("%Y-%m-%d").to_string());
        context.insert("components", &components);
        context.insert("notes", &bom.notes);

        if !self.has(BOM_DOC) {
            return Err(TemplateError::NotFound(BOM_DOC.to_string()));
        }
        self.tera
            .render(BOM_DOC, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{EntityId, EntityPrefix};
    use crate::entities::purchase_order::PoLine;
    use crate::entities::BomComponent;

    #[test]
    fn test_po_email_lists_lines_and_total() {
        let vendor = Vendor::new("Acme Organics");
        let mut po = PurchaseOrder::new("PO-2026-0003".into(), EntityId::new(EntityPrefix::Ven));
        po.lines.push(PoLine {
            sku: "KELP-01".into(),
            name: "Kelp Meal".into(),
            quantity: 40.0,
            unit_price: 2.5,
        });

        let body = TemplateGenerator::new()
            .unwrap()
            .po_email(&po, &vendor, "USD", "Pat")
            .unwrap();

        assert!(body.contains("PO-2026-0003"));
        assert!(body.contains("KELP-01"));
        assert!(body.contains("x 40 @ 2.50 = 100.00"));
        assert!(body.contains("Order total: 100.00 USD"));
        assert!(body.contains("Pat"));
    }

    #[test]
    fn test_bom_doc_numbers_components() {
        let mut bom = BillOfMaterials::new("FERT-1", "Garden Blend");
        bom.components.push(BomComponent::new("KELP-01", "Kelp Meal", 2.5, "kg"));
        bom.components.push(BomComponent::new("BONE-02", "Bone Meal", 10.0, "lb"));

        let doc = TemplateGenerator::new().unwrap().bom_doc(&bom).unwrap();
        assert!(doc.starts_with("Garden Blend"));
        assert!(doc.contains("1. Kelp Meal (KELP-01): 2.5 kg"));
        assert!(doc.contains("2. Bone Meal (BONE-02): 10 lb"));
    }
}
