//! Modal input forms and the parsing of their fields into core requests.

use anyhow::{anyhow, bail, Context, Result};
use fleetyard_core::{
    ContainerKind, ContainerSpec, ProductCatalog, SerialNumber, ShipConfig, ShipId,
};

const MAX_FIELD_LEN: usize = 48;

/// What a form collects parameters for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    NewShip,
    NewLiquid,
    NewGas,
    NewRefrigerated,
    Load { serial: SerialNumber },
    Transfer { source: ShipId, serial: SerialNumber },
    Find,
}

/// Parsed outcome of a submitted form.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    AddShip(ShipConfig),
    CreateContainer(ContainerSpec),
    Load { serial: SerialNumber, mass_kg: u64 },
    Transfer {
        source: ShipId,
        serial: SerialNumber,
        destination: ShipId,
    },
    Find(SerialNumber),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub input: String,
    pub hint: &'static str,
}

impl FormField {
    fn new(label: &'static str, hint: &'static str) -> Self {
        Self {
            label,
            input: String::new(),
            hint,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.input = value.into();
        self
    }
}

/// Multi-field text prompt rendered as a modal.
#[derive(Debug, Clone)]
pub struct FormModal {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub cursor: usize,
}

impl FormModal {
    pub fn new(kind: FormKind) -> Self {
        let fields = match kind {
            FormKind::NewShip => vec![
                FormField::new("Name", "optional"),
                FormField::new("Max speed (knots)", "e.g. 18.5"),
                FormField::new("Max containers", "count"),
                FormField::new("Max weight (tons)", "gross, cargo + tare"),
            ],
            FormKind::NewLiquid => {
                let mut fields = dimension_fields();
                fields.push(FormField::new("Dangerous cargo", "y/n").with_value("n"));
                fields
            }
            FormKind::NewGas => {
                let mut fields = dimension_fields();
                fields.push(FormField::new("Pressure (atm)", "e.g. 2.5"));
                fields
            }
            FormKind::NewRefrigerated => {
                let mut fields = dimension_fields();
                fields.push(FormField::new("Product", "e.g. Bananas"));
                fields.push(FormField::new("Temperature (°C)", "kept inside"));
                fields.push(FormField::new(
                    "Minimum temperature (°C)",
                    "blank: product catalog",
                ));
                fields
            }
            FormKind::Load { .. } => vec![FormField::new("Cargo mass (kg)", "replaces current")],
            FormKind::Transfer { .. } => {
                vec![FormField::new("Destination ship", "ship number, e.g. 2")]
            }
            FormKind::Find => vec![FormField::new("Serial number", "e.g. KON-L-1")],
        };
        let cursor = fields.first().map(|f| f.input.len()).unwrap_or(0);
        Self {
            kind,
            fields,
            focus: 0,
            cursor,
        }
    }

    pub fn title(&self) -> String {
        match self.kind {
            FormKind::NewShip => "New Ship".to_string(),
            FormKind::NewLiquid => "New Liquid Container".to_string(),
            FormKind::NewGas => "New Gas Container".to_string(),
            FormKind::NewRefrigerated => "New Refrigerated Container".to_string(),
            FormKind::Load { serial } => format!("Load {serial}"),
            FormKind::Transfer { source, serial } => format!("Transfer {serial} from {source}"),
            FormKind::Find => "Find Container".to_string(),
        }
    }

    pub fn move_focus(&mut self, delta: isize) {
        let len = self.fields.len() as isize;
        if len == 0 {
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
        self.cursor = self.current().map(|f| f.input.len()).unwrap_or(0);
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.current().map(|f| f.input.len()).unwrap_or(0) as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.current().map(|f| f.input.len()).unwrap_or(0);
    }

    pub fn insert(&mut self, ch: char) {
        let cursor = self.cursor;
        let Some(field) = self.fields.get_mut(self.focus) else {
            return;
        };
        if field.input.len() >= MAX_FIELD_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            field.input.insert(cursor, ch);
            self.cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        let cursor = self.cursor;
        if let Some(field) = self.fields.get_mut(self.focus) {
            if cursor > 0 && cursor <= field.input.len() {
                field.input.remove(cursor - 1);
                self.cursor -= 1;
            }
        }
    }

    pub fn delete(&mut self) {
        let cursor = self.cursor;
        if let Some(field) = self.fields.get_mut(self.focus) {
            if cursor < field.input.len() {
                field.input.remove(cursor);
            }
        }
    }

    pub fn is_last_field(&self) -> bool {
        self.focus + 1 >= self.fields.len()
    }

    fn current(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|f| f.input.trim())
            .unwrap_or_default()
    }

    fn labelled<T>(&self, index: usize, parse: impl Fn(&str) -> Result<T>) -> Result<T> {
        let label = self.fields.get(index).map(|f| f.label).unwrap_or("field");
        parse(self.value(index)).with_context(|| label.to_string())
    }

    /// Turn the entered text into a request for the core.
    pub fn request(&self, catalog: &ProductCatalog) -> Result<Request> {
        match self.kind {
            FormKind::NewShip => Ok(Request::AddShip(ShipConfig {
                name: self.value(0).to_string(),
                max_speed_knots: self.labelled(1, parse_f64)?,
                max_containers: self.labelled(2, parse_u64)? as usize,
                max_weight_tons: self.labelled(3, parse_u64)?,
            })),
            FormKind::NewLiquid => {
                let dangerous = self.labelled(4, parse_bool)?;
                self.container_spec(ContainerKind::Liquid { dangerous })
            }
            FormKind::NewGas => {
                let pressure_atm = self.labelled(4, parse_f64)?;
                self.container_spec(ContainerKind::Gas { pressure_atm })
            }
            FormKind::NewRefrigerated => {
                let product = self.value(4).to_string();
                if product.is_empty() {
                    bail!("Product: a product name is required");
                }
                let maintained_temperature_c = self.labelled(5, parse_i32)?;
                let minimum_temperature_c = if self.value(6).is_empty() {
                    catalog.minimum_temperature(&product).ok_or_else(|| {
                        anyhow!("Minimum temperature: '{product}' is not in the catalog, enter it")
                    })?
                } else {
                    self.labelled(6, parse_i32)?
                };
                self.container_spec(ContainerKind::Refrigerated {
                    product,
                    maintained_temperature_c,
                    minimum_temperature_c,
                })
            }
            FormKind::Load { serial } => Ok(Request::Load {
                serial,
                mass_kg: self.labelled(0, parse_u64)?,
            }),
            FormKind::Transfer { source, serial } => Ok(Request::Transfer {
                source,
                serial,
                destination: self.labelled(0, parse_ship_id)?,
            }),
            FormKind::Find => Ok(Request::Find(self.labelled(0, parse_serial)?)),
        }
    }

    fn container_spec(&self, kind: ContainerKind) -> Result<Request> {
        Ok(Request::CreateContainer(ContainerSpec {
            empty_mass_kg: self.labelled(0, parse_u64)?,
            height_cm: self.labelled(1, parse_u32)?,
            depth_cm: self.labelled(2, parse_u32)?,
            max_load_kg: self.labelled(3, parse_u64)?,
            kind,
        }))
    }
}

fn dimension_fields() -> Vec<FormField> {
    vec![
        FormField::new("Empty mass (kg)", "tare"),
        FormField::new("Height (cm)", ""),
        FormField::new("Depth (cm)", ""),
        FormField::new("Max load (kg)", "cargo capacity"),
    ]
}

pub fn parse_u64(input: &str) -> Result<u64> {
    input
        .trim()
        .parse::<u64>()
        .map_err(|_| anyhow!("'{}' is not a whole number", input.trim()))
}

pub fn parse_u32(input: &str) -> Result<u32> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| anyhow!("'{}' is not a whole number", input.trim()))
}

pub fn parse_i32(input: &str) -> Result<i32> {
    input
        .trim()
        .parse::<i32>()
        .map_err(|_| anyhow!("'{}' is not an integer", input.trim()))
}

pub fn parse_f64(input: &str) -> Result<f64> {
    let value = input
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| anyhow!("'{}' is not a number", input.trim()))?;
    if !value.is_finite() || value < 0.0 {
        bail!("'{}' must be a non-negative number", input.trim());
    }
    Ok(value)
}

pub fn parse_bool(input: &str) -> Result<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "0" => Ok(false),
        other => Err(anyhow!("'{other}' is not yes or no")),
    }
}

pub fn parse_ship_id(input: &str) -> Result<ShipId> {
    let trimmed = input.trim().trim_start_matches('#');
    trimmed
        .parse::<u32>()
        .map(ShipId::new)
        .map_err(|_| anyhow!("'{}' is not a ship number", input.trim()))
}

pub fn parse_serial(input: &str) -> Result<SerialNumber> {
    Ok(input.parse::<SerialNumber>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetyard_core::TypeCode;

    fn fill(kind: FormKind, values: &[&str]) -> FormModal {
        let mut form = FormModal::new(kind);
        for (field, value) in form.fields.iter_mut().zip(values) {
            field.input = value.to_string();
        }
        form
    }

    #[test]
    fn ship_form_builds_config() -> Result<()> {
        let form = fill(FormKind::NewShip, &["Aurora", "18,5", "4", "40"]);
        let request = form.request(&ProductCatalog::default())?;
        assert_eq!(
            request,
            Request::AddShip(ShipConfig {
                name: "Aurora".to_string(),
                max_speed_knots: 18.5,
                max_containers: 4,
                max_weight_tons: 40,
            })
        );
        Ok(())
    }

    #[test]
    fn liquid_form_reads_danger_flag() -> Result<()> {
        let form = fill(FormKind::NewLiquid, &["500", "200", "200", "1000", "yes"]);
        match form.request(&ProductCatalog::default())? {
            Request::CreateContainer(spec) => {
                assert_eq!(spec.empty_mass_kg, 500);
                assert_eq!(spec.kind, ContainerKind::Liquid { dangerous: true });
            }
            other => panic!("unexpected request {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn refrigerated_form_falls_back_to_catalog() -> Result<()> {
        let form = fill(
            FormKind::NewRefrigerated,
            &["500", "200", "200", "1000", "bananas", "14", ""],
        );
        match form.request(&ProductCatalog::default())? {
            Request::CreateContainer(spec) => assert_eq!(
                spec.kind,
                ContainerKind::Refrigerated {
                    product: "bananas".to_string(),
                    maintained_temperature_c: 14,
                    minimum_temperature_c: 13,
                }
            ),
            other => panic!("unexpected request {other:?}"),
        }

        let unknown = fill(
            FormKind::NewRefrigerated,
            &["500", "200", "200", "1000", "Caviar", "0", ""],
        );
        assert!(unknown.request(&ProductCatalog::default()).is_err());
        Ok(())
    }

    #[test]
    fn errors_name_the_offending_field() {
        let form = fill(FormKind::NewGas, &["500", "tall", "200", "1000", "2"]);
        let err = form.request(&ProductCatalog::default()).unwrap_err();
        assert!(format!("{err:#}").starts_with("Height (cm)"));
    }

    #[test]
    fn transfer_and_find_parse_identifiers() -> Result<()> {
        let serial = SerialNumber::new(TypeCode::Gas, 3);
        let form = fill(
            FormKind::Transfer {
                source: ShipId::new(1),
                serial,
            },
            &["#2"],
        );
        assert_eq!(
            form.request(&ProductCatalog::default())?,
            Request::Transfer {
                source: ShipId::new(1),
                serial,
                destination: ShipId::new(2),
            }
        );
        let find = fill(FormKind::Find, &["kon-g-3"]);
        assert_eq!(
            find.request(&ProductCatalog::default())?,
            Request::Find(serial)
        );
        Ok(())
    }

    #[test]
    fn editing_respects_cursor() {
        let mut form = FormModal::new(FormKind::Find);
        for ch in "KON-L-1".chars() {
            form.insert(ch);
        }
        form.move_home();
        form.delete();
        form.move_end();
        form.backspace();
        assert_eq!(form.fields[0].input, "ON-L-");
        form.move_focus(1);
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn parsers_reject_garbage() {
        assert!(parse_u64("-3").is_err());
        assert!(parse_f64("-1").is_err());
        assert!(parse_bool("maybe").is_err());
        assert_eq!(parse_i32(" -18 ").ok(), Some(-18));
        assert_eq!(parse_ship_id("7").ok(), Some(ShipId::new(7)));
    }
}
