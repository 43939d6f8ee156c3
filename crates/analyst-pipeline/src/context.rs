//! Market-data context handed to every analyst

use analyst_core::{AnalystResult, Market, MarketData, Sentiment, TechnicalIndicators};
use analyst_prompt::{Language, PromptBuilder};
use chrono::DateTime;

const RECENT_BARS: usize = 5;
const MAX_HEADLINES: usize = 5;

/// Everything the analysts see about one symbol
#[derive(Debug, Clone)]
pub struct StockContext {
    pub symbol: String,
    pub market: Market,
    pub data: MarketData,
    pub technical: Option<TechnicalIndicators>,
}

fn fmt2(value: f64) -> String {
    format!("{value:.2}")
}

fn percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// Large figures in 亿 / billions
fn amount(value: f64, language: Language) -> String {
    match language {
        Language::Chinese => format!("{:.2}亿", value / 1e8),
        Language::English => format!("{:.2}B", value / 1e9),
    }
}

fn bar_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map_or_else(|| timestamp.to_string(), |d| d.format("%Y-%m-%d").to_string())
}

impl StockContext {
    pub fn new(
        symbol: impl Into<String>,
        market: Market,
        data: MarketData,
        technical: Option<TechnicalIndicators>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            market,
            data,
            technical,
        }
    }

    /// Display name, falling back to the symbol
    pub fn stock_name(&self) -> &str {
        let name = self.data.basic.name.trim();
        if name.is_empty() { &self.symbol } else { name }
    }

    /// Markdown block appended to each independent analyst's prompt
    pub fn render(&self, language: Language) -> String {
        let mut b = PromptBuilder::new(language)
            .section_l("股票信息", "Stock")
            .field_l("代码", "Symbol", self.symbol.as_str())
            .field_l("名称", "Name", self.stock_name())
            .field_l("市场", "Market", self.market.display_name())
            .field_l("货币", "Currency", self.market.currency());
        b = self.quote(b);
        b = self.price_history(b);
        b = self.financials(b);
        b = self.indicators(b);
        b = self.headlines(b);
        b.build_trimmed()
    }

    fn quote(&self, b: PromptBuilder) -> PromptBuilder {
        let basic = &self.data.basic;
        let language = b.language();
        let mut b = b
            .section_l("行情", "Quote")
            .field_opt(label(language, "现价", "Price"), basic.price.map(fmt2))
            .field_opt(label(language, "涨跌幅", "Change"), basic.change_percent.map(percent))
            .field_opt(label(language, "成交额", "Turnover"), basic.turnover.map(|v| amount(v, language)))
            .field_opt(label(language, "总市值", "Market cap"), basic.market_cap.map(|v| amount(v, language)))
            .field_opt("PE", basic.pe_ratio.map(fmt2))
            .field_opt("PB", basic.pb_ratio.map(fmt2))
            .field_opt(label(language, "行业", "Industry"), basic.industry.as_deref());
        if !basic.concepts.is_empty() {
            b = b.field_l("概念", "Concepts", basic.concepts.join(", "));
        }
        b
    }

    fn price_history(&self, b: PromptBuilder) -> PromptBuilder {
        let bars = &self.data.kline;
        if bars.is_empty() {
            return b;
        }
        let high = bars.iter().map(|k| k.high).fold(f64::MIN, f64::max);
        let low = bars.iter().map(|k| k.low).fold(f64::MAX, f64::min);
        let recent = bars[bars.len().saturating_sub(RECENT_BARS)..].iter().map(|k| {
            format!("{}: O={:.2} H={:.2} L={:.2} C={:.2}", bar_date(k.timestamp), k.open, k.high, k.low, k.close)
        });

        let mut b = b.section_l("近期走势", "Recent prices");
        let range = format!("{low:.2} - {high:.2}");
        let count = bars.len().to_string();
        b = b
            .field_l("K线数量", "Bars", count)
            .field_l("区间最低-最高", "Range low-high", range);
        b.bullets(recent)
    }

    fn financials(&self, b: PromptBuilder) -> PromptBuilder {
        let Some(f) = self.data.financial.as_ref().filter(|f| !f.is_empty()) else {
            return b;
        };
        let language = b.language();
        b.section_l("财务指标", "Financials")
            .field_opt("ROE", f.roe.map(percent))
            .field_opt("ROA", f.roa.map(percent))
            .field_opt(label(language, "毛利率", "Gross margin"), f.gross_margin.map(percent))
            .field_opt(label(language, "净利率", "Net margin"), f.net_margin.map(percent))
            .field_opt(label(language, "营收增长", "Revenue growth"), f.revenue_growth.map(percent))
            .field_opt(label(language, "利润增长", "Profit growth"), f.profit_growth.map(percent))
            .field_opt("PS", f.ps_ratio.map(fmt2))
            .field_opt(label(language, "资产负债率", "Debt ratio"), f.debt_to_equity.map(percent))
            .field_opt(label(language, "流动比率", "Current ratio"), f.current_ratio.map(fmt2))
            .field_opt(label(language, "股息率", "Dividend yield"), f.dividend_yield.map(percent))
    }

    fn indicators(&self, b: PromptBuilder) -> PromptBuilder {
        let Some(t) = &self.technical else {
            return b;
        };
        let language = b.language();
        let trend = t.trend.map(|trend| match language {
            Language::Chinese => trend.label_zh().to_string(),
            Language::English => format!("{trend:?}"),
        });
        b.section_l("技术指标", "Technical indicators")
            .field_opt("MA5", t.ma5)
            .field_opt("MA10", t.ma10)
            .field_opt("MA20", t.ma20)
            .field_opt("MA60", t.ma60)
            .field_opt("RSI(14)", t.rsi14)
            .field_opt("MACD", t.macd)
            .field_opt("MACD signal", t.macd_signal)
            .field_opt("MACD hist", t.macd_histogram)
            .field_opt("BOLL upper", t.boll_upper)
            .field_opt("BOLL middle", t.boll_middle)
            .field_opt("BOLL lower", t.boll_lower)
            .field_opt("ATR(14)", t.atr14)
            .field_opt(label(language, "趋势", "Trend"), trend)
    }

    fn headlines(&self, b: PromptBuilder) -> PromptBuilder {
        if self.data.news.is_empty() {
            return b;
        }
        let language = b.language();
        let lines = self.data.news.iter().take(MAX_HEADLINES).map(|n| {
            let tag = match (n.sentiment, language) {
                (Some(Sentiment::Positive), Language::Chinese) => "[利好] ",
                (Some(Sentiment::Negative), Language::Chinese) => "[利空] ",
                (Some(Sentiment::Positive), Language::English) => "[positive] ",
                (Some(Sentiment::Negative), Language::English) => "[negative] ",
                _ => "",
            };
            format!("{tag}{}", n.title)
        });
        b.section_l("近期新闻", "Recent news").bullets(lines)
    }
}

fn label(language: Language, zh: &'static str, en: &'static str) -> &'static str {
    match language {
        Language::Chinese => zh,
        Language::English => en,
    }
}

/// Combined output of the independent analysts, read by the synthesizer
pub fn synthesis_context(results: &[AnalystResult], language: Language) -> String {
    let mut b = PromptBuilder::new(language);
    for result in results {
        let name = match language {
            Language::Chinese => result.role.display_name(),
            Language::English => result.role.english_name(),
        };
        b = b.section(format!("{name} ({:.0})", result.score));
        b = if result.raw_text.trim().is_empty() {
            b.bullets(result.risks.iter().map(String::as_str))
        } else {
            b.text(result.raw_text.trim()).newline()
        };
    }
    b.build_trimmed()
}
