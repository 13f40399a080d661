use crate::core::dates::DayCount;
use crate::pricing::normal::norm_cdf;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors arising from option pricing inputs.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

/// Which underlying quantity the closed form is written against.
///
/// Both forms give the same price; `Forward` discounts a Black-76 style
/// payoff on `F = S·e^(rT)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    #[default]
    Spot,
    Forward,
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMode::Spot => write!(f, "spot"),
            PricingMode::Forward => write!(f, "forward"),
        }
    }
}

impl FromStr for PricingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spot" => Ok(PricingMode::Spot),
            "forward" => Ok(PricingMode::Forward),
            other => Err(format!("unknown pricing mode '{other}', expected spot or forward")),
        }
    }
}

/// Call and put prices for one set of inputs, with the intermediates
/// used to produce them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionResult {
    pub mode: PricingMode,
    pub call: f64,
    pub put: f64,
    pub d1: f64,
    pub d2: f64,
    /// Time to expiry in years.
    pub time_to_expiry: f64,
    /// Forward price `S·e^(rT)`.
    pub forward: f64,
    /// Discount factor `e^(-rT)`.
    pub discount_factor: f64,
}

impl fmt::Display for OptionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Black-Scholes ({} method) ===", self.mode)?;
        writeln!(f, "Call Price:      {:.4}", self.call)?;
        writeln!(f, "Put Price:       {:.4}", self.put)?;
        writeln!(f, "d1:              {:.6}", self.d1)?;
        writeln!(f, "d2:              {:.6}", self.d2)?;
        writeln!(f, "Time to Expiry:  {:.6} years", self.time_to_expiry)?;
        writeln!(f, "Forward Price:   {:.4}", self.forward)?;
        writeln!(f, "Discount Factor: {:.6}", self.discount_factor)
    }
}

fn validate_positive(value: f64, name: &str) -> Result<f64, PricingError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PricingError::InvalidInput {
            message: format!("{name} must be positive and finite, got {value}"),
        });
    }
    Ok(value)
}

fn validate_finite(value: f64, name: &str) -> Result<f64, PricingError> {
    if !value.is_finite() {
        return Err(PricingError::InvalidInput {
            message: format!("{name} must be finite, got {value}"),
        });
    }
    Ok(value)
}

/// Price a European call and put under Black-Scholes.
///
/// `rate` and `volatility` are annualized decimals (0.05 = 5%) and
/// `time_to_expiry` is in years.
///
/// # Errors
///
/// [`PricingError::InvalidInput`] when spot, strike, volatility or time to
/// expiry is not strictly positive, when any input is not finite, or when
/// the rate and tenor overflow the forward price.
///
/// # Examples
///
/// ```
/// use pricing_risk_engine::pricing::{price, PricingMode};
///
/// let result = price(100.0, 100.0, 0.05, 0.2, 1.0, PricingMode::Spot).unwrap();
/// assert!((result.call - 10.4506).abs() < 1e-4);
/// assert!((result.put - 5.5735).abs() < 1e-4);
/// ```
pub fn price(
    spot: f64,
    strike: f64,
    rate: f64,
    volatility: f64,
    time_to_expiry: f64,
    mode: PricingMode,
) -> Result<OptionResult, PricingError> {
    validate_positive(spot, "spot")?;
    validate_positive(strike, "strike")?;
    validate_finite(rate, "rate")?;
    validate_positive(volatility, "volatility")?;
    validate_positive(time_to_expiry, "time to expiry")?;

    let sig_sqrt_t = volatility * time_to_expiry.sqrt();
    let discount_factor = (-rate * time_to_expiry).exp();
    let forward = spot * (rate * time_to_expiry).exp();

    let (d1, call, put) = match mode {
        PricingMode::Spot => {
            let d1 = ((spot / strike).ln() + (rate + 0.5 * volatility * volatility) * time_to_expiry)
                / sig_sqrt_t;
            let d2 = d1 - sig_sqrt_t;
            let call = spot * norm_cdf(d1) - strike * discount_factor * norm_cdf(d2);
            let put = strike * discount_factor * norm_cdf(-d2) - spot * norm_cdf(-d1);
            (d1, call, put)
        }
        PricingMode::Forward => {
            let d1 = ((forward / strike).ln() + 0.5 * volatility * volatility * time_to_expiry)
                / sig_sqrt_t;
            let d2 = d1 - sig_sqrt_t;
            let call = discount_factor * (forward * norm_cdf(d1) - strike * norm_cdf(d2));
            let put = discount_factor * (strike * norm_cdf(-d2) - forward * norm_cdf(-d1));
            (d1, call, put)
        }
    };

    if !forward.is_finite() || !call.is_finite() || !put.is_finite() {
        return Err(PricingError::InvalidInput {
            message: format!(
                "rate {rate} over {time_to_expiry} years overflows the pricer \
                 (forward {forward}, call {call}, put {put})"
            ),
        });
    }

    Ok(OptionResult {
        mode,
        // Cancellation in deep-moneyness cases can leave a -1e-15 residue.
        call: call.max(0.0),
        put: put.max(0.0),
        d1,
        d2: d1 - sig_sqrt_t,
        time_to_expiry,
        forward,
        discount_factor,
    })
}

/// Dated option inputs, as captured from a trade ticket.
///
/// Time to expiry is derived from the two dates with a [`DayCount`]
/// (Actual/365 Fixed unless overridden).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionInputs {
    pub spot: f64,
    pub strike: f64,
    /// Annualized risk-free rate as a decimal.
    pub rate: f64,
    /// Annualized volatility as a decimal.
    pub volatility: f64,
    pub trade_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub day_count: DayCount,
}

impl OptionInputs {
    /// Validate and build a set of inputs.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use pricing_risk_engine::pricing::OptionInputs;
    ///
    /// let trade = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let expiry = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
    /// let inputs = OptionInputs::new(50.0, 45.0, 0.03, 0.25, trade, expiry).unwrap();
    /// let (spot, forward) = inputs.price_both().unwrap();
    /// assert!((spot.call - forward.call).abs() < 1e-9);
    /// ```
    pub fn new(
        spot: f64,
        strike: f64,
        rate: f64,
        volatility: f64,
        trade_date: NaiveDate,
        expiration_date: NaiveDate,
    ) -> Result<Self, PricingError> {
        validate_positive(spot, "spot")?;
        validate_positive(strike, "strike")?;
        validate_finite(rate, "rate")?;
        validate_positive(volatility, "volatility")?;
        if expiration_date <= trade_date {
            return Err(PricingError::InvalidInput {
                message: format!(
                    "expiration date {expiration_date} must be after trade date {trade_date}"
                ),
            });
        }
        Ok(Self {
            spot,
            strike,
            rate,
            volatility,
            trade_date,
            expiration_date,
            day_count: DayCount::default(),
        })
    }

    pub fn with_day_count(mut self, day_count: DayCount) -> Self {
        self.day_count = day_count;
        self
    }

    /// Year fraction between trade and expiration.
    pub fn time_to_expiry(&self) -> f64 {
        self.day_count
            .year_fraction(self.trade_date, self.expiration_date)
    }

    pub fn forward_price(&self) -> f64 {
        self.spot * (self.rate * self.time_to_expiry()).exp()
    }

    pub fn price(&self, mode: PricingMode) -> Result<OptionResult, PricingError> {
        price(
            self.spot,
            self.strike,
            self.rate,
            self.volatility,
            self.time_to_expiry(),
            mode,
        )
    }

    /// Price with both methods: `(spot, forward)`.
    pub fn price_both(&self) -> Result<(OptionResult, OptionResult), PricingError> {
        Ok((self.price(PricingMode::Spot)?, self.price(PricingMode::Forward)?))
    }
}
