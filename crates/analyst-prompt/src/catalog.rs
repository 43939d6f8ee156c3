//! Role prompt catalog
//!
//! One bilingual template per analyst role plus a shared system prompt. Every
//! template ends with the same output contract so [`crate::parse_output`] can
//! read any role's answer.

use crate::{JinjaTemplate, Language, PromptError, PromptTemplate, Result};
use analyst_core::AnalystRole;
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

const SYSTEM_ZH: &str = "你是{{ role_name }}，就职于一家头部券商研究所，擅长中国A股、港股和美股研究。\
请基于提供的数据独立给出专业判断，不要编造数据；数据缺失时请说明并降低置信度。";

const SYSTEM_EN: &str = "You are a {{ role_name }} at a top-tier brokerage research desk covering \
A-shares, Hong Kong and US equities. Give an independent professional judgement based on the data \
provided. Never invent figures; when data is missing, say so and lower your confidence.";

const OUTPUT_ZH: &str = "

请严格按以下格式输出（每个列表3-5条）：
综合评分: <0-100的整数>
置信度: <0-100的整数>
操作建议: <强烈买入/买入/持有/观望/卖出 之一>
关键因素:
- <因素>
主要风险:
- <风险>
";

const OUTPUT_EN: &str = "

Answer strictly in this format (3-5 items per list):
Overall score: <integer 0-100>
Confidence: <integer 0-100>
Recommendation: <one of Strong Buy / Buy / Hold / Wait / Sell>
Key factors:
- <factor>
Risks:
- <risk>
";

const SYNTHESIS_OUTPUT_ZH: &str = "
投资机会:
- <机会>
执行摘要: <一段话总结>
";

const SYNTHESIS_OUTPUT_EN: &str = "
Opportunities:
- <opportunity>
Summary: <one paragraph>
";

fn role_body(role: AnalystRole, lang: Language) -> &'static str {
    match (role, lang) {
        (AnalystRole::Value, Language::Chinese) => "请以价值投资的视角分析{{ stock_name }}（{{ symbol }}）。
重点关注：内在价值与安全边际、市盈率和市净率在历史及同业中的位置、护城河、股息回报与资本配置。",
        (AnalystRole::Value, Language::English) => "Analyze {{ stock_name }} ({{ symbol }}) from a value investing perspective.
Focus on intrinsic value and margin of safety, PE and PB against history and peers, economic moat, dividends and capital allocation.",
        (AnalystRole::Technical, Language::Chinese) => "请对{{ stock_name }}（{{ symbol }}）进行技术分析。
重点关注：均线排列与趋势、RSI与MACD动能、布林带位置、成交量配合、关键支撑位与压力位。",
        (AnalystRole::Technical, Language::English) => "Perform a technical analysis of {{ stock_name }} ({{ symbol }}).
Focus on moving-average alignment and trend, RSI and MACD momentum, Bollinger band position, volume confirmation, key support and resistance.",
        (AnalystRole::Growth, Language::Chinese) => "请评估{{ stock_name }}（{{ symbol }}）的成长潜力。
重点关注：营收与利润增速、行业空间与渗透率、新业务与产品周期、成长的可持续性。",
        (AnalystRole::Growth, Language::English) => "Assess the growth potential of {{ stock_name }} ({{ symbol }}).
Focus on revenue and profit growth, addressable market and penetration, new businesses and product cycles, sustainability of growth.",
        (AnalystRole::Fundamental, Language::Chinese) => "请分析{{ stock_name }}（{{ symbol }}）的基本面。
重点关注：盈利能力（ROE、毛利率、净利率）、资产负债结构、现金流质量、商业模式与竞争格局。",
        (AnalystRole::Fundamental, Language::English) => "Analyze the fundamentals of {{ stock_name }} ({{ symbol }}).
Focus on profitability (ROE, gross and net margin), balance sheet structure, cash flow quality, business model and competitive position.",
        (AnalystRole::Risk, Language::Chinese) => "请全面识别{{ stock_name }}（{{ symbol }}）面临的风险。
重点关注：估值风险、财务与流动性风险、行业与政策风险、价格波动与回撤。评分越高表示风险越低。",
        (AnalystRole::Risk, Language::English) => "Identify every material risk facing {{ stock_name }} ({{ symbol }}).
Focus on valuation, financial and liquidity risk, industry and policy risk, volatility and drawdown. A higher score means lower risk.",
        (AnalystRole::Macro, Language::Chinese) => "请从宏观角度研判{{ stock_name }}（{{ symbol }}）。
重点关注：货币与财政政策、利率和汇率、行业景气周期、资金面与市场情绪。",
        (AnalystRole::Macro, Language::English) => "Assess {{ stock_name }} ({{ symbol }}) from a macroeconomic perspective.
Focus on monetary and fiscal policy, rates and currency, the sector cycle, liquidity and market sentiment.",
        (AnalystRole::Synthesizer, Language::Chinese) => "请综合下列六位分析师对{{ stock_name }}（{{ symbol }}）的报告，给出最终投资结论。
权重：价值25%、技术15%、成长20%、基本面15%、风险15%、宏观10%。
评级区间：85分以上强烈买入，75-84买入，60-74持有，50-59观望，50以下卖出。
请指出各方观点的分歧并说明你的取舍。",
        (AnalystRole::Synthesizer, Language::English) => "Synthesize the six analyst reports below on {{ stock_name }} ({{ symbol }}) into a final investment conclusion.
Weights: value 25%, technical 15%, growth 20%, fundamental 15%, risk 15%, macro 10%.
Tiers: 85 and above Strong Buy, 75-84 Buy, 60-74 Hold, 50-59 Wait, below 50 Sell.
Point out where the analysts disagree and explain how you weigh them.",
    }
}

fn role_template(role: AnalystRole) -> Result<JinjaTemplate> {
    let mut zh = [role_body(role, Language::Chinese), OUTPUT_ZH].concat();
    let mut en = [role_body(role, Language::English), OUTPUT_EN].concat();
    if role == AnalystRole::Synthesizer {
        zh.push_str(SYNTHESIS_OUTPUT_ZH);
        en.push_str(SYNTHESIS_OUTPUT_EN);
    }
    JinjaTemplate::bilingual(role.id(), zh, en)
}

/// Prompts for every analyst role in one language
#[derive(Debug)]
pub struct PromptCatalog {
    language: Language,
    system: JinjaTemplate,
    roles: HashMap<AnalystRole, JinjaTemplate>,
}

impl PromptCatalog {
    pub fn new(language: Language) -> Result<Self> {
        let roles = AnalystRole::ALL
            .iter()
            .map(|&role| role_template(role).map(|t| (role, t)))
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self {
            language,
            system: JinjaTemplate::bilingual("system", SYSTEM_ZH, SYSTEM_EN)?,
            roles,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// System message for a role
    pub fn system_prompt(&self, role: AnalystRole) -> Result<String> {
        let role_name = match self.language {
            Language::Chinese => role.display_name(),
            Language::English => role.english_name(),
        };
        self.system
            .render_with_fallback(self.language, &json!({ "role_name": role_name }))
    }

    /// Render a role's prompt, surfacing template errors
    pub fn render(&self, role: AnalystRole, stock_name: &str, symbol: &str) -> Result<String> {
        let template = self
            .roles
            .get(&role)
            .ok_or_else(|| PromptError::UnknownRole(role.id().to_string()))?;
        let stock_name = if stock_name.trim().is_empty() { symbol } else { stock_name };
        template.render_with_fallback(
            self.language,
            &json!({ "stock_name": stock_name, "symbol": symbol }),
        )
    }

    /// Role prompt, or an empty string when none can be produced
    ///
    /// Callers treat an empty prompt as "skip this role".
    pub fn build_prompt(&self, role: AnalystRole, stock_name: &str, symbol: &str) -> String {
        self.render(role, stock_name, symbol).unwrap_or_else(|e| {
            warn!("Failed to build prompt for {}: {}", role, e);
            String::new()
        })
    }

    /// [`Self::build_prompt`] keyed by role id; unknown ids give an empty string
    pub fn build_prompt_by_name(&self, role: &str, stock_name: &str, symbol: &str) -> String {
        match role.parse::<AnalystRole>() {
            Ok(role) => self.build_prompt(role, stock_name, symbol),
            Err(_) => {
                warn!("No prompt for unknown role '{}'", role);
                String::new()
            }
        }
    }
}
