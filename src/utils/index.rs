/// Number of decimal places of the native coin (1 XMR = 10^12 atomic units).
pub const ATOMIC_UNIT_DECIMALS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,

    #[error("amount is not a decimal number: {0}")]
    Malformed(String),

    #[error("amount has more than {ATOMIC_UNIT_DECIMALS} decimal places: {0}")]
    TooPrecise(String),

    #[error("amount does not fit into atomic units: {0}")]
    Overflow(String),

    #[error("amount must be greater than zero")]
    Zero,
}

/// Format an amount in atomic units with `decimals` fractional digits.
pub fn format_amount(amount: u64, decimals: u32) -> String {
    let scale = 10u64.pow(ATOMIC_UNIT_DECIMALS);
    let whole = amount / scale;
    let fraction = format!("{:012}", amount % scale);
    if decimals == 0 {
        return whole.to_string();
    }
    let digits = (decimals.min(ATOMIC_UNIT_DECIMALS)) as usize;
    format!("{}.{}", whole, &fraction[..digits])
}

/// Parse a decimal display amount ("1.5") into atomic units.
///
/// Integer arithmetic only; amounts that would need rounding are rejected.
pub fn parse_amount(input: &str) -> Result<u64, AmountParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountParseError::Empty);
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(AmountParseError::Malformed(trimmed.to_string()));
    }
    if fraction.len() > ATOMIC_UNIT_DECIMALS as usize {
        return Err(AmountParseError::TooPrecise(trimmed.to_string()));
    }

    let whole_units: u64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| AmountParseError::Overflow(trimmed.to_string()))?
    };
    let fraction_units: u64 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = ATOMIC_UNIT_DECIMALS as usize);
        padded
            .parse()
            .map_err(|_| AmountParseError::Malformed(trimmed.to_string()))?
    };

    let amount = whole_units
        .checked_mul(10u64.pow(ATOMIC_UNIT_DECIMALS))
        .and_then(|units| units.checked_add(fraction_units))
        .ok_or_else(|| AmountParseError::Overflow(trimmed.to_string()))?;

    if amount == 0 {
        return Err(AmountParseError::Zero);
    }
    Ok(amount)
}
