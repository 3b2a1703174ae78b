use crate::attribute::TypeMap;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct TypeRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "#")]
    pub index: String,
    #[tabled(rename = "Data type")]
    pub data_type: String,
    #[tabled(rename = "Flags")]
    pub flags: String,
    #[tabled(rename = "Scope")]
    pub scope: String,
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    if stats.is_empty() {
        return String::new();
    }
    let rows: Vec<TableRow> = stats
        .iter()
        .map(|(label, value)| TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

pub fn types_table(types: &TypeMap) -> String {
    if types.is_empty() {
        return String::new();
    }
    let rows: Vec<TypeRow> = types
        .iter()
        .map(|ty| {
            let flags: String = [
                (ty.required, 'R'),
                (ty.multi_valued, 'M'),
                (ty.multi_lingual, 'L'),
            ]
            .iter()
            .map(|(set, c)| if *set { *c } else { '-' })
            .collect();
            TypeRow {
                name: ty.name.clone(),
                group: ty.group.clone(),
                index: ty.index.map(|i| i.to_string()).unwrap_or_default(),
                data_type: ty.data_type.to_string(),
                flags,
                scope: ty.scope.to_string(),
            }
        })
        .collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}
