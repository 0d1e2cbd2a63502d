use super::{ BusinessRecord, ServiceDirectory };
use crate::models::analysis::RecommendationRequest;

pub fn format_business_block(business: &BusinessRecord) -> String {
    format!(
        "\n{}\nRating: {}/5\nEstimated Price: {}\nAvailable: {}\nPhone: {}",
        business.name,
        business.rating,
        business.price,
        business.available_time,
        business.phone
    )
}

/// Renders the final recommendation for a conversation that has every field it needs.
pub fn build_recommendation(
    directory: &ServiceDirectory,
    request: &RecommendationRequest<'_>
) -> String {
    let business_list = directory
        .find_matching(request.problem_type)
        .into_iter()
        .map(format_business_block)
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on your {} issue in {} for {}, here are the best service providers I found:\n{}",
        request.problem_type,
        request.zip_code,
        request.timing,
        business_list
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(problem_type: &'a str) -> RecommendationRequest<'a> {
        RecommendationRequest { problem_type, zip_code: "94110", timing: "tomorrow morning" }
    }

    #[test]
    fn block_uses_estimated_price_label() {
        let directory = ServiceDirectory::builtin();
        let block = format_business_block(&directory.records()[0]);
        assert_eq!(
            block,
            "\nQuick Fix Appliances\nRating: 4.8/5\nEstimated Price: $80-120\nAvailable: Today, 2-4 PM\nPhone: (555) 123-4567"
        );
    }

    #[test]
    fn recommendation_lists_matching_businesses_verbatim() {
        let directory = ServiceDirectory::builtin();
        let text = build_recommendation(&directory, &request("broken oven"));
        assert!(
            text.starts_with(
                "Based on your broken oven issue in 94110 for tomorrow morning, here are the best service providers I found:\n"
            )
        );
        assert!(text.contains("Pro Appliance Repair"));
        assert!(text.contains("(555) 234-5678"));
        assert!(text.contains("$70-100"));
        assert!(!text.contains("Quick Fix Appliances"));
    }

    #[test]
    fn blocks_are_separated_by_blank_lines() {
        let directory = ServiceDirectory::builtin();
        let text = build_recommendation(&directory, &request("washer"));
        assert_eq!(text.matches("Rating: ").count(), 3);
        assert!(text.contains("Phone: (555) 123-4567\n\n\nPro Appliance Repair"));
    }

    #[test]
    fn no_match_leaves_only_the_header() {
        let directory = ServiceDirectory::builtin();
        let text = build_recommendation(&directory, &request("roof"));
        assert!(text.ends_with("I found:\n"));
        assert!(!text.contains("Rating:"));
    }
}
