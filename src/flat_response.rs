// Key-suffixed flat encoding of a search response
// Hotels are numbered from 1 in emitted order. A hotel with one offer gets plain keys,
// several offers get letter suffixes a..h and then the offer's index.

use serde_json::{json, Map, Value};

use crate::aggregator::{HotelOffers, PriceCalculationResult, SearchResponse};

const OFFER_SUFFIXES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

pub fn offer_suffix(index: usize) -> String {
    OFFER_SUFFIXES
        .get(index)
        .map_or_else(|| index.to_string(), |letter| letter.to_string())
}

pub fn flatten_response(response: &SearchResponse) -> Value {
    let mut flat = Map::new();
    flat.insert("searchParams".to_string(), json!(response.search_params));

    let emitted = response.hotels.iter().filter(|hotel| !hotel.offers.is_empty());
    for (index, hotel) in emitted.enumerate() {
        insert_hotel(&mut flat, index + 1, hotel);
    }

    Value::Object(flat)
}

fn insert_hotel(flat: &mut Map<String, Value>, number: usize, hotel: &HotelOffers) {
    let info = &hotel.hotel;
    flat.insert(format!("hotelName_{}", number), json!(info.name));
    flat.insert(format!("city_{}", number), json!(info.location));
    flat.insert(format!("website_{}", number), json!(info.website));
    flat.insert(format!("tel_{}", number), json!(info.phone));
    flat.insert(format!("whatsapp_{}", number), json!(info.whatsapp_link));
    flat.insert(format!("info_{}", number), json!(info.info_tag));

    match hotel.offers.as_slice() {
        [offer] => insert_offer(flat, &number.to_string(), offer),
        offers => {
            for (index, offer) in offers.iter().enumerate() {
                insert_offer(flat, &format!("{}_{}", number, offer_suffix(index)), offer);
            }
        }
    }
}

fn insert_offer(flat: &mut Map<String, Value>, key: &str, offer: &PriceCalculationResult) {
    flat.insert(format!("roomType_{}", key), json!(offer.room_type));
    flat.insert(format!("totalRooms_{}", key), json!(offer.room_count));
    flat.insert(format!("concept_{}", key), json!(offer.concept));
    flat.insert(format!("totalPrice_{}", key), json!(offer.total_price));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SearchParams;
    use crate::reference::Hotel;
    use chrono::NaiveDate;
    use test_case::test_case;

    fn offer(room_type: &str, concept: &str, total_price: i64) -> PriceCalculationResult {
        PriceCalculationResult {
            concept: concept.to_string(),
            room_type: room_type.to_string(),
            room_count: 1,
            total_price,
            price_per_night: total_price / 2,
            nights: 2,
            currency: "TRY".to_string(),
            room_arrangement: Vec::new(),
            is_available: true,
        }
    }

    fn hotel_offers(id: u32, name: &str, offers: Vec<PriceCalculationResult>) -> HotelOffers {
        HotelOffers {
            hotel: Hotel {
                id,
                name: name.to_string(),
                location: "Bodrum".to_string(),
                website: format!("https://{}.example", id),
                phone: "+90 252 000 00 00".to_string(),
                whatsapp_link: String::new(),
                info_tag: "Beachfront".to_string(),
            },
            offers,
        }
    }

    fn response(hotels: Vec<HotelOffers>) -> SearchResponse {
        SearchResponse {
            search_params: SearchParams {
                check_in: NaiveDate::from_ymd_opt(2030, 6, 10).unwrap(),
                check_out: NaiveDate::from_ymd_opt(2030, 6, 12).unwrap(),
                total_nights: 2,
                total_adults: 2,
                total_children: 1,
                children_ages: "7".to_string(),
            },
            hotels,
            skipped: Vec::new(),
        }
    }

    #[test_case(0, "a"; "#1 First offer")]
    #[test_case(7, "h"; "#2 Last letter")]
    #[test_case(8, "8"; "#3 Falls back to index")]
    #[test_case(11, "11"; "#4 Later index")]
    fn test_offer_suffix(index: usize, expected: &str) {
        assert_eq!(offer_suffix(index), expected);
    }

    #[test]
    fn test_single_offer_uses_plain_keys() {
        let flat = flatten_response(&response(vec![hotel_offers(
            1,
            "Seaside",
            vec![offer("Standard", "All Inclusive", 5000)],
        )]));

        assert_eq!(flat["hotelName_1"], "Seaside");
        assert_eq!(flat["city_1"], "Bodrum");
        assert_eq!(flat["website_1"], "https://1.example");
        assert_eq!(flat["info_1"], "Beachfront");
        assert_eq!(flat["roomType_1"], "Standard");
        assert_eq!(flat["totalRooms_1"], 1);
        assert_eq!(flat["concept_1"], "All Inclusive");
        assert_eq!(flat["totalPrice_1"], 5000);
        assert!(flat.get("roomType_1_a").is_none());
    }

    #[test]
    fn test_multiple_offers_use_letter_suffixes() {
        let flat = flatten_response(&response(vec![hotel_offers(
            1,
            "Seaside",
            vec![
                offer("Standard", "Half Board", 1400),
                offer("Standard", "All Inclusive", 2000),
            ],
        )]));

        assert_eq!(flat["concept_1_a"], "Half Board");
        assert_eq!(flat["totalPrice_1_a"], 1400);
        assert_eq!(flat["concept_1_b"], "All Inclusive");
        assert_eq!(flat["totalPrice_1_b"], 2000);
        assert!(flat.get("roomType_1").is_none());
        assert_eq!(flat["hotelName_1"], "Seaside");
    }

    #[test]
    fn test_hotels_numbered_in_emitted_order() {
        let flat = flatten_response(&response(vec![
            hotel_offers(7, "Empty", Vec::new()),
            hotel_offers(3, "First", vec![offer("Standard", "Room Only", 900)]),
            hotel_offers(5, "Second", vec![offer("Suite", "Room Only", 1900)]),
        ]));

        assert_eq!(flat["hotelName_1"], "First");
        assert_eq!(flat["hotelName_2"], "Second");
        assert!(flat.get("hotelName_3").is_none());
    }

    #[test]
    fn test_search_params_included() {
        let flat = flatten_response(&response(Vec::new()));
        let params = &flat["searchParams"];

        assert_eq!(params["checkIn"], "2030-06-10");
        assert_eq!(params["totalNights"], 2);
        assert_eq!(params["childrenAges"], "7");
        assert_eq!(flat.as_object().map(|map| map.len()), Some(1));
    }
}
