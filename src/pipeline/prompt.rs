//! Prompt templates for transcription and record extraction.

/// Instruction sent alongside the raw audio bytes.
pub const TRANSCRIPTION_PROMPT: &str = "Transcribe this audio clip in detail:";

/// Extraction instructions, with the transcript appended at the end.
///
/// The section names double as the top-level keys of the extracted record,
/// so renaming one here changes what downstream lookups see.
const EXTRACTION_INSTRUCTIONS: &str = r#"Extract the following EHR components from this medical conversation transcript and return them in JSON format.
Include any available information for each component:

1. patientDemographics (name, age, gender, contact info)
2. medicalHistory (past diagnoses, surgeries, family history)
3. medicationsAndAllergies (current medications, allergies)
4. laboratoryAndTestResults (recent tests, results)
5. clinicalNotes (chief complaint, symptoms, observations)
6. vitalSigns (blood pressure, heart rate, temperature, etc)
7. immunizationRecords (vaccines)
8. ordersAndPrescriptions (tests ordered, medications prescribed)
9. billingAndAdministrativeData (insurance info, billing codes)

Format the response as valid JSON only, with no additional text.

Transcript:
"#;

/// Build the extraction prompt for one transcript.
pub fn build_extraction_prompt(transcript: &str) -> String {
    format!("{EXTRACTION_INSTRUCTIONS}{transcript}")
}
