//! Human-readable labels for the NAF activity codes prospects usually fall
//! under. Unknown codes are shown as-is.

const LABELS: &[(&str, &str)] = &[
    ("10.71C", "Boulangerie et boulangerie-pâtisserie"),
    ("10.71D", "Pâtisserie"),
    ("43.21A", "Travaux d'installation électrique"),
    ("43.22A", "Travaux d'installation d'eau et de gaz"),
    ("43.22B", "Travaux d'installation d'équipements thermiques"),
    ("43.32A", "Travaux de menuiserie bois et PVC"),
    ("43.34Z", "Travaux de peinture et vitrerie"),
    ("43.39Z", "Autres travaux de finition"),
    (
        "45.20A",
        "Entretien et réparation de véhicules automobiles légers",
    ),
    ("47.11B", "Commerce d'alimentation générale"),
    (
        "47.24Z",
        "Commerce de détail de pain, pâtisserie et confiserie",
    ),
    ("47.71Z", "Commerce de détail d'habillement"),
    ("47.76Z", "Commerce de détail de fleurs et plantes"),
    ("47.91A", "Vente à distance sur catalogue général"),
    ("56.10A", "Restauration traditionnelle"),
    ("56.10B", "Cafétérias et autres libres-services"),
    ("56.10C", "Restauration de type rapide"),
    ("56.30Z", "Débits de boissons"),
    ("62.01Z", "Programmation informatique"),
    ("69.10Z", "Activités juridiques"),
    ("69.20Z", "Activités comptables"),
    (
        "70.22Z",
        "Conseil pour les affaires et autres conseils de gestion",
    ),
    ("73.11Z", "Activités des agences de publicité"),
    ("74.10Z", "Activités spécialisées de design"),
    ("82.11Z", "Services administratifs combinés de bureau"),
    ("86.21Z", "Activité des médecins généralistes"),
    ("86.23Z", "Pratique dentaire"),
    ("86.90E", "Activités des professionnels de la rééducation"),
    (
        "95.11Z",
        "Réparation d'ordinateurs et d'équipements périphériques",
    ),
    ("96.02A", "Coiffure"),
    ("96.02B", "Soins de beauté"),
];

/// Label for a NAF code, falling back to the code itself.
pub fn activity_label(code: Option<&str>) -> String {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return "Unknown activity".to_string();
    };

    LABELS
        .binary_search_by(|(c, _)| c.cmp(&code))
        .map(|i| LABELS[i].1.to_string())
        .unwrap_or_else(|_| code.to_string())
}
