//! Plain-text tax report.
//!
//! Sections always appear in the same order: income, deductions, tax
//! breakdown, total, risk, flags, recommendations. The output carries no
//! timestamp, so the same result and assessment always render to the same
//! bytes.

use std::fmt::Write;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::tax::calculator::TaxComputationResult;
use crate::tax::risk::FraudAssessment;
use crate::types::{round_money, Money, Rate};

const WIDTH: usize = 70;
const LABEL_WIDTH: usize = 30;

/// Render `result` and `assessment` as a fixed-layout report.
pub fn format_report(result: &TaxComputationResult, assessment: &FraudAssessment) -> String {
    let heavy = "=".repeat(WIDTH);
    let light = "-".repeat(WIDTH);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "TAX ANALYSIS REPORT");
    let _ = writeln!(
        out,
        "Financial Year: {} | Regime: {}",
        result.financial_year,
        result.regime.as_str().to_uppercase()
    );
    let _ = writeln!(out, "{heavy}");

    section(&mut out, "INCOME", &light);
    line(&mut out, "Gross Income:", &rupees(result.gross_income));

    section(&mut out, "DEDUCTIONS", &light);
    for d in &result.deduction_details {
        let note = if !d.permitted {
            " (not permitted)"
        } else if d.was_clipped() {
            " (clipped)"
        } else {
            ""
        };
        line(
            &mut out,
            &format!("  {}:", d.section_code),
            &format!("{} of {}{note}", rupees(d.allowed), rupees(d.claimed)),
        );
    }
    line(
        &mut out,
        "Total Deductions Applied:",
        &rupees(result.total_deductions_applied),
    );
    line(&mut out, "Taxable Income:", &rupees(result.taxable_income));

    section(&mut out, "TAX BREAKDOWN", &light);
    let b = &result.tax_breakdown;
    line(&mut out, "Tax from Slabs:", &rupees(b.tax_from_slabs));
    line(&mut out, "Rebate:", &rupees(b.rebate));
    line(&mut out, "Surcharge:", &rupees(b.surcharge));
    line(&mut out, "Cess:", &rupees(b.cess));
    let _ = writeln!(out, "{light}");
    line(&mut out, "TOTAL TAX PAYABLE:", &rupees(result.total_tax));
    line(
        &mut out,
        "Effective Tax Rate:",
        &format!("{}%", percent(result.effective_tax_rate)),
    );

    section(&mut out, "RISK ASSESSMENT", &light);
    line(
        &mut out,
        "Risk Score:",
        &format!("{:.2} / 1.00", assessment.risk_score),
    );
    line(&mut out, "Risk Level:", assessment.risk_level.as_str());
    line(
        &mut out,
        "Compliance Score:",
        &format!("{}%", assessment.compliance_score),
    );

    numbered(&mut out, "FLAGS", &assessment.flags);
    numbered(&mut out, "RECOMMENDATIONS", &assessment.recommendations);

    let _ = writeln!(out, "{heavy}");
    out
}

fn section(out: &mut String, title: &str, rule: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{rule}");
}

fn line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{label:<width$}{value}", width = LABEL_WIDTH);
}

fn numbered(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    if items.is_empty() {
        let _ = writeln!(out, "   (none)");
    }
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "   {}. {item}", i + 1);
    }
}

/// `₹1,234,567.80`
pub fn rupees(amount: Money) -> String {
    let rounded = format!("{:.2}", round_money(amount));
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}₹{grouped}.{frac}")
}

fn percent(rate: Rate) -> String {
    format!("{:.2}", (rate * dec!(100)).round_dp(2).max(Decimal::ZERO))
}
