// src/model/summary.rs
//
// Parameter summary sheets built straight from the model configuration.
// They are laid out for reading, not pivoted, so headers are positional.

use anyhow::{Context, Result};

use super::ModelConfig;
use crate::table::{Cell, Table};

fn blank(width: usize) -> Vec<Cell> {
    vec![Cell::from(""); width]
}

fn heading(title: &str, width: usize) -> Vec<Cell> {
    let mut row = blank(width);
    row[0] = title.into();
    row
}

/// `1200` → `1200`, `12.5` → `12.5`.
fn amount(n: f64) -> String {
    Cell::Number(n).label()
}

/// `25000` → `25,000`.
fn thousands(n: f64) -> String {
    let s = amount(n.abs());
    let (int, frac) = match s.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (s, None),
    };
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if n < 0.0 { "-" } else { "" };
    match frac {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn money(cfg: &ModelConfig, n: f64) -> String {
    format!("{} {}", cfg.currency, amount(n))
}

pub fn dashboard(cfg: &ModelConfig) -> Table {
    let mut rows = vec![
        heading("MODEL PARAMETERS", 3),
        vec!["Parameter".into(), "Value".into(), "Description".into()],
        vec![
            "MODEL_YEARS".into(),
            cfg.model_years.into(),
            "Number of years to project".into(),
        ],
        vec![
            "CURRENCY".into(),
            cfg.currency.clone().into(),
            "Currency".into(),
        ],
        vec![
            "INFLATION_RATE".into(),
            (cfg.inflation_rate * 100.0).into(),
            "Annual inflation rate (%)".into(),
        ],
        vec![
            "DISCOUNT_RATE".into(),
            (cfg.discount_rate * 100.0).into(),
            "Discount rate for DCF (%)".into(),
        ],
        blank(3),
        heading("MEMBERSHIP PARAMETERS", 3),
        vec![
            "Membership Type".into(),
            "Monthly Price".into(),
            "Annual Price".into(),
        ],
    ];
    rows.extend(cfg.membership_types.iter().map(|m| {
        vec![
            m.name.clone().into(),
            m.monthly_price.into(),
            m.annual_price.into(),
        ]
    }));
    Table::positional(rows)
}

/// Number of classes in a punch pass, from the leading integer of its name.
fn pass_classes(name: &str) -> Result<u32> {
    name.split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .filter(|n| *n > 0)
        .with_context(|| format!("punch pass `{}` does not start with a class count", name))
}

pub fn pricing_table(cfg: &ModelConfig) -> Result<Table> {
    let mut rows = vec![
        heading("PRICING TABLE", 4),
        heading("MEMBERSHIPS", 4),
        vec![
            "Type".into(),
            "Monthly Price".into(),
            "Annual Price".into(),
            "Savings".into(),
        ],
    ];
    for m in &cfg.membership_types {
        let yearly = m.monthly_price * 12.0;
        let savings = if yearly > 0.0 {
            (yearly - m.annual_price) / yearly * 100.0
        } else {
            0.0
        };
        rows.push(vec![
            m.name.clone().into(),
            money(cfg, m.monthly_price).into(),
            money(cfg, m.annual_price).into(),
            format!("{:.1}%", savings).into(),
        ]);
    }

    rows.push(blank(4));
    rows.push(heading("PUNCH PASSES", 4));
    rows.push(vec![
        "Type".into(),
        "Price".into(),
        "Price Per Class".into(),
        "Discount".into(),
    ]);
    for p in &cfg.punch_pass_types {
        let classes = pass_classes(&p.name)?;
        rows.push(vec![
            p.name.clone().into(),
            money(cfg, p.price).into(),
            format!("{} {:.2}", cfg.currency, p.price / f64::from(classes)).into(),
            format!("{:.1}%", p.discount * 100.0).into(),
        ]);
    }
    Ok(Table::positional(rows))
}

pub fn venue_characteristics(cfg: &ModelConfig) -> Table {
    let mut rows = vec![
        heading("VENUE CHARACTERISTICS", 4),
        heading("ROOMS", 4),
        vec![
            "Room Type".into(),
            "Capacity".into(),
            "Setup Cost".into(),
            "Maintenance".into(),
        ],
    ];
    rows.extend(cfg.rooms.iter().map(|r| {
        vec![
            r.name.clone().into(),
            r.capacity.into(),
            format!("{} {}", cfg.currency, thousands(r.setup_cost)).into(),
            format!("{} {}/year", cfg.currency, thousands(r.maintenance_annual)).into(),
        ]
    }));

    let summary = |label: &str, value: u32| {
        let mut row = heading(label, 4);
        row[1] = value.into();
        row
    };
    rows.push(blank(4));
    rows.push(heading("CAPACITY SUMMARY", 4));
    rows.push(summary("Total Room Capacity", cfg.total_capacity()));
    rows.push(summary("Classes Per Day", cfg.classes_per_day()));
    rows.push(summary("Days Open Per Week", cfg.days_open_per_week));
    Table::positional(rows)
}
