//! PyO3 bindings for the cardvalue engine.
//!
//! Exposes the Rust implementation to the Python UI:
//! - Market analysis (metrics, scores, letter grades)
//! - Profit / grading scenarios
//! - Grading verdicts and text recommendations
//! - Marketplace search string construction

use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBool;

use cardvalue_analytics::{MarketAnalysis as RustMarketAnalysis, MarketAnalyzer};
use cardvalue_core::config::{GradingConfig, GradingService};
use cardvalue_core::{
    Config as RustConfig, Error as RustError, GradeClass, MarketGrade as RustMarketGrade,
    MarketMetrics as RustMarketMetrics, MarketScores as RustMarketScores,
    ProfitScenario as RustProfitScenario, RawListing as RustRawListing, RawPrice,
};
use cardvalue_ingestion::ListingQuery;
use cardvalue_profit::{
    CardCondition, GradingAnalysis as RustGradingAnalysis, GradingAnalyzer, ProfitCalculator,
    Recommendation, Scenario, ScenarioInput,
};

fn to_py_err(e: RustError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn load_config(config_json: Option<&str>) -> PyResult<RustConfig> {
    match config_json {
        Some(json) => RustConfig::from_json(json).map_err(to_py_err),
        None => Ok(RustConfig::default()),
    }
}

/// Python price value as a scraped price. Booleans are rejected rather than
/// read as 1.0 / 0.0.
fn raw_price(value: &Bound<'_, PyAny>) -> PyResult<Option<RawPrice>> {
    if value.is_none() {
        return Ok(None);
    }
    if value.is_instance_of::<PyBool>() {
        return Err(PyTypeError::new_err("price must be a number or text, not bool"));
    }
    match value.extract::<f64>() {
        Ok(number) => Ok(Some(RawPrice::Number(number))),
        Err(_) => Ok(Some(RawPrice::Text(value.extract::<String>()?))),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value).map_err(|e| PyValueError::new_err(e.to_string()))
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// A scraped sold listing before normalization.
#[pyclass]
#[derive(Clone)]
pub struct RawListing {
    inner: RustRawListing,
}

#[pymethods]
impl RawListing {
    /// `price` may be a number or text such as "$1,234.56".
    #[new]
    #[pyo3(signature = (title, price=None, date=None, image_url=None))]
    fn new(
        title: String,
        price: Option<&Bound<'_, PyAny>>,
        date: Option<String>,
        image_url: Option<String>,
    ) -> PyResult<Self> {
        let price = match price {
            Some(value) => raw_price(value)?,
            None => None,
        };
        Ok(RawListing {
            inner: RustRawListing {
                title,
                price,
                date,
                image_url,
            },
        })
    }

    #[getter]
    fn title(&self) -> &str {
        &self.inner.title
    }

    #[getter]
    fn date(&self) -> Option<&str> {
        self.inner.date.as_deref()
    }

    #[getter]
    fn image_url(&self) -> Option<&str> {
        self.inner.image_url.as_deref()
    }

    fn __repr__(&self) -> String {
        format!("RawListing(title={:?}, price={:?})", self.inner.title, self.inner.price)
    }
}

/// Descriptive market statistics.
#[pyclass]
#[derive(Clone)]
pub struct MarketMetrics {
    #[pyo3(get)]
    pub sale_count: usize,
    #[pyo3(get)]
    pub avg_price: f64,
    #[pyo3(get)]
    pub median_price: f64,
    #[pyo3(get)]
    pub std_price: f64,
    #[pyo3(get)]
    pub min_price: f64,
    #[pyo3(get)]
    pub max_price: f64,
    #[pyo3(get)]
    pub trend_ratio: f64,
    #[pyo3(get)]
    pub momentum: f64,
    #[pyo3(get)]
    pub volume_30d: usize,
    #[pyo3(get)]
    pub volume_90d: usize,
    #[pyo3(get)]
    pub psa9_multiplier: Option<f64>,
    #[pyo3(get)]
    pub psa10_multiplier: Option<f64>,
}

impl From<&RustMarketMetrics> for MarketMetrics {
    fn from(m: &RustMarketMetrics) -> Self {
        MarketMetrics {
            sale_count: m.sale_count,
            avg_price: m.avg_price,
            median_price: m.median_price,
            std_price: m.std_price,
            min_price: m.min_price,
            max_price: m.max_price,
            trend_ratio: m.trend_ratio,
            momentum: m.momentum,
            volume_30d: m.volume_30d,
            volume_90d: m.volume_90d,
            psa9_multiplier: m.psa9_multiplier,
            psa10_multiplier: m.psa10_multiplier,
        }
    }
}

/// 0-10 market scores and composite sentiment.
#[pyclass]
#[derive(Clone)]
pub struct MarketScores {
    #[pyo3(get)]
    pub volatility: f64,
    #[pyo3(get)]
    pub trend: f64,
    #[pyo3(get)]
    pub liquidity: f64,
    #[pyo3(get)]
    pub momentum: f64,
    #[pyo3(get)]
    pub stability: f64,
    #[pyo3(get)]
    pub volume: f64,
    #[pyo3(get)]
    pub sentiment: f64,
}

#[pymethods]
impl MarketScores {
    fn __repr__(&self) -> String {
        format!(
            "MarketScores(volatility={:.2}, trend={:.2}, liquidity={:.2}, sentiment={:.2})",
            self.volatility, self.trend, self.liquidity, self.sentiment
        )
    }
}

impl From<&RustMarketScores> for MarketScores {
    fn from(s: &RustMarketScores) -> Self {
        MarketScores {
            volatility: s.volatility,
            trend: s.trend,
            liquidity: s.liquidity,
            momentum: s.momentum,
            stability: s.stability,
            volume: s.volume,
            sentiment: s.sentiment,
        }
    }
}

/// Buy/sell letter grades.
#[pyclass]
#[derive(Clone)]
pub struct MarketGrade {
    #[pyo3(get)]
    pub buy_grade: String,
    #[pyo3(get)]
    pub sell_grade: String,
}

impl From<&RustMarketGrade> for MarketGrade {
    fn from(g: &RustMarketGrade) -> Self {
        MarketGrade {
            buy_grade: g.buy_grade.to_string(),
            sell_grade: g.sell_grade.to_string(),
        }
    }
}

/// Grade-or-not analysis.
#[pyclass]
#[derive(Clone)]
pub struct GradingAnalysis {
    #[pyo3(get)]
    pub current_value: f64,
    #[pyo3(get)]
    pub total_grading_cost: f64,
    #[pyo3(get)]
    pub break_even: f64,
    #[pyo3(get)]
    pub psa9_price: f64,
    #[pyo3(get)]
    pub psa9_profit: f64,
    #[pyo3(get)]
    pub psa9_roi: f64,
    #[pyo3(get)]
    pub psa10_price: f64,
    #[pyo3(get)]
    pub psa10_profit: f64,
    #[pyo3(get)]
    pub psa10_roi: f64,
    #[pyo3(get)]
    pub verdict: String,
}

impl From<RustGradingAnalysis> for GradingAnalysis {
    fn from(a: RustGradingAnalysis) -> Self {
        GradingAnalysis {
            current_value: a.current_value,
            total_grading_cost: a.total_grading_cost,
            break_even: a.break_even,
            psa9_price: a.psa9.price,
            psa9_profit: a.psa9.profit,
            psa9_roi: a.psa9.roi,
            psa10_price: a.psa10.price,
            psa10_profit: a.psa10.profit,
            psa10_roi: a.psa10.roi,
            verdict: a.verdict.to_string(),
        }
    }
}

/// Full market analysis for one listing query.
#[pyclass]
pub struct MarketAnalysis {
    inner: RustMarketAnalysis,
    grading: GradingConfig,
}

#[pymethods]
impl MarketAnalysis {
    #[getter]
    fn metrics(&self) -> MarketMetrics {
        (&self.inner.metrics).into()
    }

    #[getter]
    fn scores(&self) -> MarketScores {
        (&self.inner.scores).into()
    }

    #[getter]
    fn grade(&self) -> MarketGrade {
        (&self.inner.grade).into()
    }

    #[getter]
    fn total_listings(&self) -> usize {
        self.inner.total_listings
    }

    #[getter]
    fn filtered_listings(&self) -> usize {
        self.inner.filtered_listings
    }

    #[getter]
    fn outliers_removed(&self) -> usize {
        self.inner.outliers_removed
    }

    #[getter]
    fn dropped_records(&self) -> u64 {
        self.inner.dropped_records
    }

    /// Projected price, or None with too little dated history.
    #[getter]
    fn projected_price(&self) -> Option<f64> {
        self.inner.projection.as_ref().map(|p| p.projected_price)
    }

    /// Grade-or-not verdict for a raw copy of this card.
    #[pyo3(signature = (purchase_price=None, psa9_price=None, psa10_price=None))]
    fn grading_analysis(
        &self,
        purchase_price: Option<f64>,
        psa9_price: Option<f64>,
        psa10_price: Option<f64>,
    ) -> GradingAnalysis {
        GradingAnalyzer::new(self.grading.clone())
            .analyze(&self.inner.metrics, purchase_price, psa9_price, psa10_price)
            .into()
    }

    /// (summary, buyer, seller) recommendation text.
    #[pyo3(signature = (roi=None))]
    fn recommendation(&self, roi: Option<f64>) -> (String, String, String) {
        let rec = Recommendation::compose(&self.inner.metrics, &self.inner.scores, roi);
        (rec.summary, rec.buyer, rec.seller)
    }

    /// The complete analysis, including variation and segment breakdowns, as JSON.
    fn to_json(&self) -> PyResult<String> {
        to_json(&self.inner)
    }
}

/// Result of a profit calculation.
#[pyclass]
#[derive(Clone)]
pub struct ProfitScenario {
    inner: RustProfitScenario,
}

#[pymethods]
impl ProfitScenario {
    #[getter]
    fn market_price(&self) -> f64 {
        self.inner.market_price
    }

    #[getter]
    fn expected_value(&self) -> f64 {
        self.inner.expected_value
    }

    #[getter]
    fn total_costs(&self) -> f64 {
        self.inner.total_costs
    }

    #[getter]
    fn fee_amount(&self) -> f64 {
        self.inner.fee_amount
    }

    #[getter]
    fn net_profit(&self) -> f64 {
        self.inner.net_profit
    }

    #[getter]
    fn roi(&self) -> f64 {
        self.inner.roi
    }

    #[getter]
    fn break_even_price(&self) -> f64 {
        self.inner.break_even_price
    }

    #[getter]
    fn success_probability(&self) -> Option<f64> {
        self.inner.success_probability
    }

    #[getter]
    fn sales_count(&self) -> usize {
        self.inner.sales_count
    }

    #[getter]
    fn risk_level(&self) -> &'static str {
        self.inner.risk_level.description()
    }

    fn to_json(&self) -> PyResult<String> {
        to_json(&self.inner)
    }

    fn __repr__(&self) -> String {
        format!(
            "ProfitScenario(market_price={:.2}, net_profit={:.2}, roi={:.2})",
            self.inner.market_price, self.inner.net_profit, self.inner.roi
        )
    }
}

// ============================================================================
// Engine Classes
// ============================================================================

/// Market analyzer.
#[pyclass(name = "MarketAnalyzer")]
pub struct PyMarketAnalyzer {
    inner: MarketAnalyzer,
}

#[pymethods]
impl PyMarketAnalyzer {
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = load_config(config_json)?;
        Ok(PyMarketAnalyzer {
            inner: MarketAnalyzer::new(config).map_err(to_py_err)?,
        })
    }

    /// Analyze a batch of raw listings.
    fn analyze(&self, py: Python<'_>, listings: Vec<RawListing>) -> MarketAnalysis {
        let raws: Vec<RustRawListing> = listings.into_iter().map(|l| l.inner).collect();
        let inner = py.allow_threads(|| self.inner.analyze(&raws));
        MarketAnalysis {
            inner,
            grading: self.inner.config().grading.clone(),
        }
    }

    /// Analyze a JSON array of raw listings.
    fn analyze_json(&self, py: Python<'_>, json: &str) -> PyResult<MarketAnalysis> {
        let raws = RustRawListing::list_from_json(json).map_err(to_py_err)?;
        let inner = py.allow_threads(|| self.inner.analyze(&raws));
        Ok(MarketAnalysis {
            inner,
            grading: self.inner.config().grading.clone(),
        })
    }
}

/// Profit / grading calculator.
#[pyclass(name = "ProfitCalculator")]
pub struct PyProfitCalculator {
    inner: ProfitCalculator,
}

#[pymethods]
impl PyProfitCalculator {
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = load_config(config_json)?;
        Ok(PyProfitCalculator {
            inner: ProfitCalculator::from_config(&config).map_err(to_py_err)?,
        })
    }

    /// Evaluate "Raw", "PSA 9" or "PSA 10". `fee_rate` is a fraction.
    #[allow(clippy::too_many_arguments)]
    #[pyo3(signature = (
        scenario,
        purchase_price,
        shipping_cost=0.0,
        fee_rate=None,
        raw_market_median=None,
        raw_sales=Vec::new(),
        graded_sales=Vec::new(),
        grading_service="economy",
        grading_fee=None,
        condition=None,
    ))]
    fn calculate_profit(
        &self,
        scenario: String,
        purchase_price: f64,
        shipping_cost: f64,
        fee_rate: Option<f64>,
        raw_market_median: Option<f64>,
        raw_sales: Vec<f64>,
        graded_sales: Vec<f64>,
        grading_service: &str,
        grading_fee: Option<f64>,
        condition: Option<&str>,
    ) -> PyResult<ProfitScenario> {
        let grading_service = GradingService::parse(grading_service).ok_or_else(|| {
            PyValueError::new_err(format!("unknown grading service {grading_service:?}"))
        })?;
        let condition = match condition {
            Some(label) => Some(CardCondition::parse(label).ok_or_else(|| {
                PyValueError::new_err(format!("unknown card condition {label:?}"))
            })?),
            None => None,
        };

        let input = ScenarioInput {
            scenario,
            purchase_price,
            shipping_cost,
            fee_rate,
            raw_market_median,
            raw_sales,
            graded_sales,
            grading_service,
            grading_fee,
            condition,
        };
        let inner = self.inner.calculate_profit(&input).map_err(to_py_err)?;
        Ok(ProfitScenario { inner })
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Build the marketplace search string for a card.
#[pyfunction]
#[pyo3(signature = (
    player_name,
    year=None,
    card_set=None,
    card_number=None,
    variation=None,
    scenario="Raw",
    negative_keywords="",
))]
fn search_query(
    player_name: &str,
    year: Option<&str>,
    card_set: Option<&str>,
    card_number: Option<&str>,
    variation: Option<&str>,
    scenario: &str,
    negative_keywords: &str,
) -> PyResult<String> {
    let grade = Scenario::parse(scenario)
        .map_err(to_py_err)?
        .target_grade()
        .unwrap_or(GradeClass::Raw);

    let mut query = ListingQuery::new(player_name)
        .with_scenario(grade)
        .with_negative_keywords(negative_keywords);
    if let Some(year) = year {
        query = query.with_year(year);
    }
    if let Some(card_set) = card_set {
        query = query.with_card_set(card_set);
    }
    if let Some(card_number) = card_number {
        query = query.with_card_number(card_number);
    }
    if let Some(variation) = variation {
        query = query.with_variation(variation);
    }
    Ok(query.search_string())
}

/// Route engine `tracing` events to stderr. Returns False if a subscriber was
/// already installed.
#[pyfunction]
#[pyo3(signature = (filter="info"))]
fn init_logging(filter: &str) -> PyResult<bool> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok())
}

// ============================================================================
// Module Definition
// ============================================================================

/// Card market valuation engine.
#[pymodule]
fn cardvalue(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<RawListing>()?;
    m.add_class::<MarketMetrics>()?;
    m.add_class::<MarketScores>()?;
    m.add_class::<MarketGrade>()?;
    m.add_class::<MarketAnalysis>()?;
    m.add_class::<GradingAnalysis>()?;
    m.add_class::<ProfitScenario>()?;

    // Engine classes
    m.add_class::<PyMarketAnalyzer>()?;
    m.add_class::<PyProfitCalculator>()?;

    // Functions
    m.add_function(wrap_pyfunction!(search_query, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyo3::types::{PyFloat, PyString};

    #[test]
    fn test_raw_price_from_python() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let number = PyFloat::new_bound(py, 12.5).into_any();
            assert_eq!(raw_price(&number).unwrap(), Some(RawPrice::Number(12.5)));

            let text = PyString::new_bound(py, "$1,250.00").into_any();
            assert_eq!(raw_price(&text).unwrap(), Some(RawPrice::Text("$1,250.00".into())));

            assert_eq!(raw_price(&py.None().into_bound(py)).unwrap(), None);

            let flag = PyBool::new_bound(py, true).to_owned().into_any();
            let err = raw_price(&flag).unwrap_err();
            assert!(err.is_instance_of::<PyTypeError>(py));
        });
    }
}
