//! Keyword sentiment for news headlines

use analyst_core::{NewsItem, Sentiment};

const POSITIVE: [&str; 16] = [
    "增长", "盈利", "利好", "突破", "上涨", "增持", "推荐", "买入", "上升", "强劲", "超预期",
    "创新高", "beat", "surge", "upgrade", "record high",
];

const NEGATIVE: [&str; 17] = [
    "下降", "亏损", "利空", "下跌", "减持", "卖出", "疲软", "不及预期", "风险", "警示", "创新低",
    "暴跌", "预警", "miss", "plunge", "downgrade", "lawsuit",
];

const STEP: f64 = 0.2;

/// Score in `[-1, 1]`: each matched positive keyword adds 0.2, each negative one subtracts 0.2
pub fn score_headline(title: &str) -> f64 {
    let lowered = title.to_lowercase();
    let hits = |words: &[&str]| words.iter().filter(|w| lowered.contains(*w)).count() as f64;
    let score = STEP * (hits(&POSITIVE) - hits(&NEGATIVE));
    (score * 10.0).round().clamp(-10.0, 10.0) / 10.0
}

pub fn classify(score: f64) -> Sentiment {
    if score > 0.1 {
        Sentiment::Positive
    } else if score < -0.1 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Fill in sentiment for items the provider left unlabelled
pub fn annotate(news: &mut [NewsItem]) {
    for item in news.iter_mut().filter(|n| n.sentiment.is_none()) {
        let score = score_headline(&item.title);
        item.sentiment = Some(classify(score));
        item.sentiment_score = Some(score);
    }
}
