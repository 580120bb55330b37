//! User-facing text in every supported language.

use mdr_core::{GameError, Language};

/// Message table for one language.
pub struct Messages {
    pub title: &'static str,
    pub idle_hint: &'static str,
    selected_hint: &'static str,
    pub bin_title: &'static str,
    pub status_title: &'static str,
    pub progress_title: &'static str,
    pub keys: &'static str,
    pub success_title: &'static str,
    pub success_message: &'static [&'static str],
    pub success_button: &'static str,
    pub failure_title: &'static str,
    pub failure_message: &'static [&'static str],
    pub failure_button: &'static str,
    round_over: &'static str,
    unknown_bin: &'static str,
    language_changed: &'static str,
}

static ENGLISH: Messages = Messages {
    title: "MACRO DATA REFINEMENT",
    idle_hint: "Click and drag to select numbers that feel scary or bad.",
    selected_hint: "{count} numbers selected. Drag to a bin.",
    bin_title: "Bin",
    status_title: "Status",
    progress_title: "Refinement",
    keys: "[1-9] deposit  [r] reset  [l] language  [q] quit",
    success_title: "Refinement Complete",
    success_message: &["All data has been properly categorized. Your work meets our standards."],
    success_button: "Process New Data",
    failure_title: "CATASTROPHIC FAILURE",
    failure_message: &[
        "Your inability to properly distribute the numbers has resulted in a critical system overload.",
        "The board is disappointed in your performance.",
        "You will be terminated.",
    ],
    failure_button: "RETRY SEQUENCE",
    round_over: "This sequence is closed. Press r to begin a new one.",
    unknown_bin: "There is no bin {bin}.",
    language_changed: "Language: English",
};

static FRENCH: Messages = Messages {
    title: "AFFINAGE DES MACRO-DONNÉES",
    idle_hint: "Cliquez et glissez pour sélectionner les nombres qui vous semblent effrayants.",
    selected_hint: "{count} nombres sélectionnés. Glissez-les vers un bac.",
    bin_title: "Bac",
    status_title: "État",
    progress_title: "Affinage",
    keys: "[1-9] déposer  [r] réinitialiser  [l] langue  [q] quitter",
    success_title: "Affinage terminé",
    success_message: &["Toutes les données ont été correctement classées. Votre travail est conforme."],
    success_button: "Traiter de nouvelles données",
    failure_title: "ÉCHEC CATASTROPHIQUE",
    failure_message: &[
        "Votre incapacité à répartir les nombres a provoqué une surcharge critique du système.",
        "Le conseil est déçu de votre performance.",
        "Vous serez licencié.",
    ],
    failure_button: "RELANCER LA SÉQUENCE",
    round_over: "Cette séquence est terminée. Appuyez sur r pour recommencer.",
    unknown_bin: "Le bac {bin} n'existe pas.",
    language_changed: "Langue : français",
};

/// Message table for `language`.
pub fn messages(language: Language) -> &'static Messages {
    match language {
        Language::En => &ENGLISH,
        Language::Fr => &FRENCH,
    }
}

impl Messages {
    /// Hint shown while `count` tiles are selected.
    pub fn selection(&self, count: usize) -> String {
        if count == 0 {
            self.idle_hint.to_string()
        } else {
            self.selected_hint.replace("{count}", &count.to_string())
        }
    }

    /// Status text for a rejected deposit.
    pub fn rejection(&self, err: &GameError) -> String {
        match err {
            GameError::RoundOver => self.round_over.to_string(),
            GameError::UnknownBin { bin, .. } => {
                self.unknown_bin.replace("{bin}", &(bin + 1).to_string())
            }
            GameError::InvalidTile { .. } => err.to_string(),
        }
    }

    /// Confirmation after switching language.
    pub fn language_changed(&self) -> &'static str {
        self.language_changed
    }
}
