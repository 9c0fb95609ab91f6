//! Prompt template builders
//!
//! One pure function per feature. Builders never touch the network and return
//! identical prompts for identical requests. Option validation happens here so
//! that a bad option is rejected before any upstream call.

use super::normalize::word_count;
use super::request::{CountOption, FeatureRequest};
use crate::error::{AppError, AppResult};

/// Signature shared by every builder in the registry
pub type PromptBuilder = fn(&FeatureRequest) -> AppResult<String>;

pub const NUM_COMPLETIONS: CountOption = CountOption::new("num_completions", 3, 10);
pub const NUM_VARIATIONS: CountOption = CountOption::new("num_variations", 3, 10);

const DEFAULT_TARGET_LENGTH: i64 = 500;
const DEFAULT_INTENSITY: i64 = 50;
const DEFAULT_CREATIVITY: f64 = 0.5;

/// Humanization techniques in the order their clauses appear in the prompt
///
/// Each option is enabled unless the request sets it to `false`.
pub const HUMANIZE_TECHNIQUES: &[(&str, &str)] = &[
    ("pattern_breaking", "vary sentence patterns and structures"),
    ("natural_flow", "add natural conversational flow"),
    (
        "idiom_integration",
        "incorporate idioms and colloquialisms where appropriate",
    ),
    ("contraction_control", "use contractions naturally"),
    ("emotional_tone", "add subtle emotional nuances"),
];

/// Adverb describing a tone intensity on the 0-100 scale
pub fn intensity_descriptor(intensity: u8) -> &'static str {
    match intensity {
        0..=39 => "subtly",
        40..=69 => "moderately",
        _ => "strongly",
    }
}

/// Humanization option keys that are enabled for this request, in declared order
pub fn enabled_techniques(request: &FeatureRequest) -> AppResult<Vec<&'static str>> {
    let mut enabled = Vec::with_capacity(HUMANIZE_TECHNIQUES.len());
    for (key, _) in HUMANIZE_TECHNIQUES {
        if request.flag(key)?.unwrap_or(true) {
            enabled.push(*key);
        }
    }
    Ok(enabled)
}

/// Tone intensity, defaulting to 50
pub fn intensity(request: &FeatureRequest) -> AppResult<u8> {
    match request.integer("intensity")? {
        None => Ok(DEFAULT_INTENSITY as u8),
        Some(value @ 0..=100) => Ok(value as u8),
        Some(value) => Err(AppError::Validation(format!(
            "intensity must be between 0 and 100, got {}",
            value
        ))),
    }
}

/// Rewrite creativity in `[0, 1]`, defaulting to 0.5
pub fn creativity_level(request: &FeatureRequest) -> AppResult<f64> {
    match request.number("creativity_level")? {
        None => Ok(DEFAULT_CREATIVITY),
        Some(value) if value.is_finite() && (0.0..=1.0).contains(&value) => Ok(value),
        Some(value) => Err(AppError::Validation(format!(
            "creativity_level must be between 0.0 and 1.0, got {}",
            value
        ))),
    }
}

/// Target word count for `expand`, defaulting to 500
pub fn target_length(request: &FeatureRequest) -> AppResult<i64> {
    positive_integer(request, "target_length").map(|n| n.unwrap_or(DEFAULT_TARGET_LENGTH))
}

fn positive_integer(request: &FeatureRequest, key: &str) -> AppResult<Option<i64>> {
    match request.integer(key)? {
        Some(value) if value <= 0 => Err(AppError::Validation(format!(
            "{} must be greater than 0, got {}",
            key, value
        ))),
        other => Ok(other),
    }
}

fn non_blank<'a>(request: &'a FeatureRequest, key: &str) -> AppResult<Option<&'a str>> {
    Ok(request
        .string(key)?
        .map(str::trim)
        .filter(|value| !value.is_empty()))
}

pub fn prompt(request: &FeatureRequest) -> AppResult<String> {
    Ok(match non_blank(request, "context")? {
        Some(context) => format!("{}\n\n{}", context, request.text()),
        None => request.text().to_string(),
    })
}

pub fn analyze_intent(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Analyze the intent of this text and provide:\n\
         1. Primary intent (e.g., question, request, statement, command)\n\
         2. Topic/subject\n\
         3. Sentiment (positive, neutral, negative)\n\
         4. Urgency level (low, medium, high)\n\n\
         Text: \"{}\"\n\n\
         Respond in JSON format.",
        request.text()
    ))
}

pub fn summarize(request: &FeatureRequest) -> AppResult<String> {
    let length = match request.string("length")? {
        Some("short") => "in 2-3 sentences",
        Some("medium") => "in 1 paragraph (4-6 sentences)",
        Some("long") => "in 2-3 paragraphs",
        _ => "in 1 paragraph",
    };
    let style = match request.string("style")? {
        Some("bullets") => "as bullet points",
        Some("paragraph") => "as a cohesive paragraph",
        Some("key-points") => "highlighting the key points",
        _ => "as a paragraph",
    };
    Ok(format!(
        "Summarize the following text {} {}.\n\nText: {}\n\nSummary:",
        length,
        style,
        request.text()
    ))
}

pub fn key_points(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Extract the main key points from this text. List only the most important points, \
         one per line, without numbering or bullets.\n\nText: {}\n\nKey Points:",
        request.text()
    ))
}

pub fn write(request: &FeatureRequest) -> AppResult<String> {
    let mut prompt = format!("Write content based on this prompt: {}", request.text());
    if let Some(style) = non_blank(request, "style")? {
        prompt.push_str(&format!("\nStyle: {}", style));
    }
    if let Some(tone) = non_blank(request, "tone")? {
        prompt.push_str(&format!("\nTone: {}", tone));
    }
    if let Some(words) = positive_integer(request, "word_count")? {
        prompt.push_str(&format!("\nTarget length: approximately {} words", words));
    }
    prompt.push_str("\n\nGenerate the content:");
    Ok(prompt)
}

pub fn complete(request: &FeatureRequest) -> AppResult<String> {
    let count = NUM_COMPLETIONS.resolve(request)?;
    Ok(format!(
        "Given this incomplete text, provide {} different ways to complete it.\n\
         Provide only the completion text for each option, separated by newlines.\n\n\
         Incomplete text: \"{}\"\n\n\
         Completions:",
        count,
        request.text()
    ))
}

pub fn expand(request: &FeatureRequest) -> AppResult<String> {
    let target = target_length(request)?;
    Ok(format!(
        "Expand the following text from {} words to approximately {} words.\n\
         Add relevant details, examples, and elaboration while maintaining the original \
         meaning and style.\n\n\
         Original text: {}\n\n\
         Expanded version:",
        word_count(request.text()),
        target,
        request.text()
    ))
}

pub fn rewrite(request: &FeatureRequest) -> AppResult<String> {
    creativity_level(request)?;

    let mut prompt = String::from("Rewrite the following text");
    if let Some(style) = non_blank(request, "style")? {
        prompt.push_str(&format!(" in a {} style", style));
    }
    if request.flag("preserve_meaning")?.unwrap_or(true) {
        prompt.push_str(", preserving the original meaning");
    } else {
        prompt.push_str(", feel free to interpret creatively");
    }
    prompt.push_str(&format!(
        "\n\nOriginal text: {}\n\nRewritten version:",
        request.text()
    ));
    Ok(prompt)
}

pub fn paraphrase(request: &FeatureRequest) -> AppResult<String> {
    let count = NUM_VARIATIONS.resolve(request)?;
    Ok(format!(
        "Generate {} different paraphrased versions of this text.\n\
         Each version should convey the same meaning but use different words and sentence \
         structures.\n\
         Provide each version on a new line, separated by \"---\".\n\n\
         Original: {}\n\n\
         Paraphrased versions:",
        count,
        request.text()
    ))
}

pub fn simplify(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Simplify this text to make it easier to understand.\n\
         Use simpler words, shorter sentences, and clearer structure while maintaining the \
         core message.\n\n\
         Original text: {}\n\n\
         Simplified version:",
        request.text()
    ))
}

pub fn humanize(request: &FeatureRequest) -> AppResult<String> {
    let enabled = enabled_techniques(request)?;
    let clauses: Vec<&str> = HUMANIZE_TECHNIQUES
        .iter()
        .filter(|(key, _)| enabled.contains(key))
        .map(|(_, clause)| *clause)
        .collect();

    let mut prompt =
        String::from("Rewrite this text to make it sound more human and less AI-generated.\n");
    if !clauses.is_empty() {
        prompt.push_str(&format!("Apply these techniques: {}.\n", clauses.join(", ")));
    }
    prompt.push_str(&format!(
        "\nOriginal text: {}\n\nHumanized version:",
        request.text()
    ));
    Ok(prompt)
}

pub fn adjust_tone(request: &FeatureRequest) -> AppResult<String> {
    let tone = request.required_string("tone")?.trim();
    let intensity = intensity(request)?;
    Ok(format!(
        "Rewrite this text with a {} {} tone (intensity: {}/100).\n\n\
         Original text: {}\n\n\
         Rewritten with {} tone:",
        intensity_descriptor(intensity),
        tone,
        intensity,
        request.text(),
        tone
    ))
}

pub fn stream_rewrite(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Rewrite this text with improved clarity and flow:\n\n{}",
        request.text()
    ))
}

/// Source language, `"auto"` when absent
pub fn source_language(request: &FeatureRequest) -> AppResult<&str> {
    Ok(non_blank(request, "source_language")?.unwrap_or("auto"))
}

pub fn translate(request: &FeatureRequest) -> AppResult<String> {
    let target = request.required_string("target_language")?.trim();
    Ok(match source_language(request)? {
        "auto" => format!(
            "Translate this text to {}:\n\n{}\n\nTranslation:",
            target,
            request.text()
        ),
        source => format!(
            "Translate this text from {} to {}:\n\n{}\n\nTranslation:",
            source,
            target,
            request.text()
        ),
    })
}

pub fn detect_language(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Detect the language of this text and provide:\n\
         1. Language name\n\
         2. ISO language code\n\
         3. Confidence level (high/medium/low)\n\n\
         Text: {}\n\n\
         Respond in JSON format with fields: language, code, confidence",
        request.text()
    ))
}

pub fn proofread(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Perform a comprehensive proofreading check on this text. Identify:\n\
         1. Grammar errors\n\
         2. Spelling mistakes\n\
         3. Punctuation issues\n\
         4. Style improvements\n\
         5. Clarity suggestions\n\n\
         Text: {}\n\n\
         Provide a detailed analysis in JSON format with fields: grammar_errors, \
         spelling_errors, punctuation_issues, style_suggestions, overall_quality_score (0-100)",
        request.text()
    ))
}

pub fn grammar_check(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Identify all grammar errors in this text. For each error, provide:\n\
         - The incorrect text\n\
         - The type of error\n\
         - The correction\n\
         - A brief explanation\n\n\
         Text: {}\n\n\
         List each error on a new line in this format: ERROR | TYPE | CORRECTION | EXPLANATION",
        request.text()
    ))
}

pub fn spelling_check(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Identify all spelling errors in this text. For each error, provide:\n\
         - The misspelled word\n\
         - The correct spelling\n\n\
         Text: {}\n\n\
         List each error on a new line in this format: MISSPELLED | CORRECT",
        request.text()
    ))
}

pub fn readability(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Analyze the readability of this text and provide:\n\
         1. Overall readability score (0-100, where 100 is easiest to read)\n\
         2. Reading level (e.g., \"8th grade\", \"college\", \"professional\")\n\
         3. Average sentence length\n\
         4. Vocabulary complexity (simple/moderate/complex)\n\
         5. Suggestions for improvement\n\n\
         Text: {}\n\n\
         Respond in JSON format.",
        request.text()
    ))
}

pub fn auto_fix(request: &FeatureRequest) -> AppResult<String> {
    Ok(format!(
        "Fix all grammar, spelling, punctuation, and style errors in this text.\n\
         Return ONLY the corrected text without explanations or formatting.\n\n\
         Original text: {}\n\n\
         Corrected text:",
        request.text()
    ))
}

// Image features: the instruction is fixed, the image travels as an attachment.

pub fn ocr(_request: &FeatureRequest) -> AppResult<String> {
    Ok("Extract all text from this image. Return only the extracted text without any \
        additional commentary."
        .to_string())
}

pub fn describe_image(_request: &FeatureRequest) -> AppResult<String> {
    Ok("Provide a detailed description of this image, including objects, people, setting, \
        colors, and mood."
        .to_string())
}

pub fn detect_objects(_request: &FeatureRequest) -> AppResult<String> {
    Ok(
        "List all objects visible in this image. Provide only the object names, one per line."
            .to_string(),
    )
}

pub fn analyze_scene(_request: &FeatureRequest) -> AppResult<String> {
    Ok("Analyze this image and provide:\n\
        1. Scene type (indoor/outdoor, location type)\n\
        2. Main subjects\n\
        3. Composition quality\n\
        4. Lighting conditions\n\
        5. Mood/atmosphere\n\n\
        Respond in JSON format."
        .to_string())
}

pub fn analyze_document(_request: &FeatureRequest) -> AppResult<String> {
    Ok("Analyze this document image and provide:\n\
        1. Document type (e.g., letter, form, invoice, receipt)\n\
        2. Layout structure\n\
        3. Extracted text\n\
        4. Key information identified\n\n\
        Respond in JSON format."
        .to_string())
}
