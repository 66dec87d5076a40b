//! CSV exchange for BOM component lists and vendor lists

use std::collections::HashMap;
use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use thiserror::Error;

use crate::entities::{BillOfMaterials, BomComponent, Vendor};
use crate::mrp::validation::{bom_line, parse_days, parse_number, ValidationError};

/// Column order for BOM component files
pub const BOM_HEADERS: [&str; 4] = ["sku", "name", "quantity", "unit"];

/// Column order for vendor files
pub const VENDOR_HEADERS: [&str; 8] = [
    "name",
    "contact_email",
    "phone",
    "website",
    "address",
    "lead_time_days",
    "payment_terms",
    "notes",
];

#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Import statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportStats {
    pub rows_processed: usize,
    pub entities_created: usize,
    pub entities_updated: usize,
    pub errors: usize,
    pub skipped: usize,
}

/// Map lower-cased header name to column index
pub fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_lowercase().trim().to_string(), i))
        .collect()
}

/// A trimmed, non-empty field value
pub fn get_field(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    field: &str,
) -> Option<String> {
    header_map
        .get(field)
        .and_then(|&idx| record.get(idx))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn format_quantity(q: f64) -> String {
    if q.fract() == 0.0 && q.abs() < 1e15 {
        format!("{}", q as i64)
    } else {
        q.to_string()
    }
}

/// Write a BOM's component lines as CSV
pub fn export_bom_csv<W: Write>(bom: &BillOfMaterials, writer: W) -> Result<(), CsvImportError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(BOM_HEADERS)?;
    for c in &bom.components {
        wtr.write_record([
            c.sku.as_str(),
            c.name.as_str(),
            format_quantity(c.quantity).as_str(),
            c.unit.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// A header line and one example row
pub fn bom_template() -> String {
    format!(
        "{}\nKELP-01,Kelp Meal,2.5,kg\n",
        BOM_HEADERS.join(",")
    )
}

/// A header line and one example row
pub fn vendor_template() -> String {
    format!(
        "{}\nAcme Organics,orders@acme.example,555-0100,https://acme.example,\"1 Main St, Springfield\",14,Net 30,\n",
        VENDOR_HEADERS.join(",")
    )
}

/// One row that failed to import
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number in the file, counting the header
    pub row: usize,
    pub message: String,
}

/// Result of reading a component file
#[derive(Debug, Default)]
pub struct BomImport {
    pub components: Vec<BomComponent>,
    pub errors: Vec<RowError>,
}

/// Read component lines. Every imported line gets a fresh line id.
pub fn import_bom_csv<R: Read>(input: R) -> Result<BomImport, CsvImportError> {
    let mut rdr = reader(input);
    let header_map = build_header_map(rdr.headers()?);
    for required in ["sku", "quantity"] {
        if !header_map.contains_key(required) {
            return Err(CsvImportError::MissingColumn(required));
        }
    }

    let mut out = BomImport::default();
    for (idx, result) in rdr.records().enumerate() {
        let row = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                out.errors.push(RowError {
                    row,
                    message: format!("CSV parse error: {}", e),
                });
                continue;
            }
        };

        let Some(sku) = get_field(&record, &header_map, "sku") else {
            out.errors.push(RowError {
                row,
                message: ValidationError::MissingField("sku").to_string(),
            });
            continue;
        };

        let quantity = match parse_number("quantity", get_field(&record, &header_map, "quantity").as_deref()) {
            Ok(Some(q)) => q,
            Ok(None) => {
                out.errors.push(RowError {
                    row,
                    message: ValidationError::MissingField("quantity").to_string(),
                });
                continue;
            }
            Err(e) => {
                out.errors.push(RowError {
                    row,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let name = get_field(&record, &header_map, "name").unwrap_or_default();
        let unit = get_field(&record, &header_map, "unit").unwrap_or_default();
        match bom_line(&sku, &name, quantity, &unit) {
            Ok(line) => out.components.push(line),
            Err(e) => out.errors.push(RowError {
                row,
                message: e.to_string(),
            }),
        }
    }

    Ok(out)
}

/// Write vendors as CSV
pub fn export_vendors_csv<W: Write>(vendors: &[Vendor], writer: W) -> Result<(), CsvImportError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(VENDOR_HEADERS)?;
    for v in vendors {
        let lead = v.lead_time_days.map(|d| d.to_string()).unwrap_or_default();
        wtr.write_record([
            v.name.as_str(),
            v.contact_email.as_deref().unwrap_or(""),
            v.phone.as_deref().unwrap_or(""),
            v.website.as_deref().unwrap_or(""),
            v.address.as_deref().unwrap_or(""),
            lead.as_str(),
            v.payment_terms.as_deref().unwrap_or(""),
            v.notes.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// One parsed vendor row with its validation outcome
#[derive(Debug)]
pub struct VendorRow {
    pub row: usize,
    pub payload: Option<Vendor>,
    pub errors: Vec<String>,
}

impl VendorRow {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.payload.is_some()
    }
}

/// Parse every row, checking each field before building an insert payload
pub fn parse_vendor_rows<R: Read>(input: R) -> Result<Vec<VendorRow>, CsvImportError> {
    let mut rdr = reader(input);
    let header_map = build_header_map(rdr.headers()?);
    if !header_map.contains_key("name") {
        return Err(CsvImportError::MissingColumn("name"));
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let row = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                rows.push(VendorRow {
                    row,
                    payload: None,
                    errors: vec![format!("CSV parse error: {}", e)],
                });
                continue;
            }
        };

        let mut errors = Vec::new();
        let name = get_field(&record, &header_map, "name");
        if name.is_none() {
            errors.push(ValidationError::MissingField("name").to_string());
        }
        let lead_time = match parse_days(
            "lead_time_days",
            get_field(&record, &header_map, "lead_time_days").as_deref(),
        ) {
            Ok(days) => days,
            Err(e) => {
                errors.push(e.to_string());
                None
            }
        };

        let payload = match name {
            Some(name) if errors.is_empty() => {
                let mut vendor = Vendor::new(name);
                vendor.contact_email = get_field(&record, &header_map, "contact_email");
                vendor.phone = get_field(&record, &header_map, "phone");
                vendor.website = get_field(&record, &header_map, "website");
                vendor.address = get_field(&record, &header_map, "address");
                vendor.lead_time_days = lead_time;
                vendor.payment_terms = get_field(&record, &header_map, "payment_terms");
                vendor.notes = get_field(&record, &header_map, "notes");
                Some(vendor)
            }
            _ => None,
        };

        rows.push(VendorRow { row, payload, errors });
    }

    Ok(rows)
}

/// Only the payloads that passed validation
pub fn committable(rows: Vec<VendorRow>) -> Vec<Vendor> {
    rows.into_iter()
        .filter(|r| r.errors.is_empty())
        .filter_map(|r| r.payload)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bom_export_then_import_keeps_lines() {
        let mut bom = BillOfMaterials::new("FERT-10", "Bloom 10-30-20");
        bom.components.push(BomComponent::new("KELP-01", "Kelp Meal", 2.5, "kg"));
        bom.components.push(BomComponent::new("BONE-02", "Bone Meal, Steamed", 10.0, "lb"));
        bom.components.push(BomComponent::new("BAG-50", "Bag \"50 lb\"", 1.0, "ea"));

        let mut buf = Vec::new();
        export_bom_csv(&bom, &mut buf).unwrap();
        let imported = import_bom_csv(buf.as_slice()).unwrap();

        assert!(imported.errors.is_empty());
        assert_eq!(imported.components.len(), 3);
        for (orig, back) in bom.components.iter().zip(&imported.components) {
            assert!(orig.same_content(back), "{:?} != {:?}", orig, back);
            assert_ne!(orig.id, back.id);
        }
    }

    #[test]
    fn test_bom_line_from_loose_input_survives_round_trip() {
        let mut bom = BillOfMaterials::new("FERT-10", "Bloom 10-30-20");
        bom.components.push(bom_line("KELP-01", "  Kelp Meal ", 2.5, " kg ").unwrap());
        bom.components.push(bom_line("BAG-50", "", 1.0, "").unwrap());

        let mut buf = Vec::new();
        export_bom_csv(&bom, &mut buf).unwrap();
        let imported = import_bom_csv(buf.as_slice()).unwrap();

        assert!(imported.errors.is_empty());
        for (orig, back) in bom.components.iter().zip(&imported.components) {
            assert!(orig.same_content(back), "{:?} != {:?}", orig, back);
        }
    }

    #[test]
    fn test_bom_import_reports_bad_rows() {
        let input = "sku,name,quantity,unit\n,No Sku,1,ea\nX-1,Bad Qty,lots,ea\nX-2,Good,3,kg\n";
        let imported = import_bom_csv(input.as_bytes()).unwrap();

        assert_eq!(imported.components.len(), 1);
        assert_eq!(imported.components[0].sku, "X-2");
        assert_eq!(imported.errors.len(), 2);
        assert_eq!(imported.errors[0].row, 2);
        assert_eq!(imported.errors[1].row, 3);
    }

    #[test]
    fn test_bom_import_requires_quantity_column() {
        let err = import_bom_csv("sku,name\nA,B\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CsvImportError::MissingColumn("quantity")));
    }

    #[test]
    fn test_bom_template_parses() {
        let imported = import_bom_csv(bom_template().as_bytes()).unwrap();
        assert_eq!(imported.components.len(), 1);
        assert!(imported.errors.is_empty());
    }

    #[test]
    fn test_vendor_rows_validated_per_field() {
        let input = "name,contact_email,lead_time_days\n\
                     Acme,a@acme.example,14\n\
                     ,nobody@example.com,7\n\
                     Slowpoke,,two weeks\n\
                     Blank Lead,,\n";
        let rows = parse_vendor_rows(input.as_bytes()).unwrap();

        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_valid());
        assert!(!rows[1].is_valid());
        assert!(rows[1].errors[0].contains("name"));
        assert!(!rows[2].is_valid());
        assert!(rows[2].errors[0].contains("lead_time_days"));
        assert!(rows[3].is_valid());

        let vendors = committable(rows);
        let names: Vec<_> = vendors.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Blank Lead"]);
        assert_eq!(vendors[0].lead_time_days, Some(14));
    }

    #[test]
    fn test_vendor_template_is_valid() {
        let rows = parse_vendor_rows(vendor_template().as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_valid());
        assert_eq!(
            rows[0].payload.as_ref().unwrap().address.as_deref(),
            Some("1 Main St, Springfield")
        );
    }
}
