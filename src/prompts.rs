//! Prompt text for the compliance analysis request.
//!
//! Centralising the prompt here keeps the wording in exactly one place and
//! lets unit tests inspect it without a live model.
//!
//! The prompt is assembled from a fixed analyst preamble, the question, the
//! reference context, and a response template with four mandatory headings
//! (Findings, Compliance Status, Recommendation, Actionable Steps for
//! Remediation). The model's answer is passed through untouched; nothing
//! here parses it.

/// Role and task instructions sent before the question.
pub const ANALYST_PREAMBLE: &str = "You are a senior regulatory compliance analyst specializing in HKMA's Banking (Capital) Rules (BCR), particularly the IRB approach for credit risk. \
Analyze the provided document images and respond to the regulatory question with strict adherence to BCR requirements.";

/// Required response structure, appended after the context.
pub const RESPONSE_TEMPLATE: &str = r#"Provide a structured analysis in the following EXACT format (include all headings):

**Findings:**
- Describe specifically what the documentation contains or lacks regarding this requirement
- Identify any explicit mentions or omissions of key concepts
- For each finding, cite document location (e.g., 'Page 5, Section 2.3')
- Quote relevant sections where possible

**Compliance Status:**
- Explicitly state if documentation complies with BCR Article 123.4 regarding model transparency
- Assess overall compliance (compliant/partially compliant/non-compliant)
- Summarize the core reason (1-2 sentences)

**Recommendation:**
- Suggest specific improvements if non-compliant
- Recommend additional documentation needed
- Reference relevant BCR articles (e.g., 'BCR Schedule 2 §1(e)')
- Distinguish between immediate fixes and long-term enhancements

**Actionable Steps for Remediation:**
- Numbered list of concrete tasks (assignable to teams)
- Include timeline estimates (e.g., '30 days')
- Mention regulatory engagement steps (e.g., 'Submit to HKMA for pre-approval')

Maintain a formal, evidence-based tone. Avoid speculation; only use facts from the document and BCR. Prioritize clarity and traceability in all sections."#;

/// Section headings the template requires, in order.
pub const REQUIRED_HEADINGS: [&str; 4] = [
    "Findings",
    "Compliance Status",
    "Recommendation",
    "Actionable Steps for Remediation",
];

/// Build the analysis prompt for one question.
pub fn build_analysis_prompt(question: &str, context: &str) -> String {
    format!(
        "{ANALYST_PREAMBLE}\n\n\
         Regulatory Question:\n{question}\n\n\
         Reference Context:\n{context}\n\n\
         {RESPONSE_TEMPLATE}"
    )
}
