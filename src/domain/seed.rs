use crate::domain::Location;

/// Built-in locations used when no stored collection is available.
pub fn seed_locations() -> Vec<Location> {
    vec![
        Location::new(1, "Văn phòng Hoàn Kiếm", "1 P. Hàng Trống, Hàng Trống, Hoàn Kiếm, Hà Nội, Việt Nam"),
        Location::new(2, "Văn phòng Cầu Giấy", "1 Dịch Vọng Hậu, Cầu Giấy, Hà Nội, Việt Nam"),
        Location::new(3, "Văn phòng Ba Đình", "28A Điện Biên Phủ, Điện Biên, Ba Đình, Hà Nội, Việt Nam"),
        Location::new(4, "Văn phòng Times City", "458 P. Minh Khai, Khu đô thị Times City, Vĩnh Tuy, Hai Bà Trưng, Hà Nội"),
        Location::new(5, "Văn phòng Royal City", "72A Đ. Nguyễn Trãi, Thượng Đình, Thanh Xuân, Hà Nội"),
        Location::new(6, "Văn phòng Mỹ Đình", "Tòa nhà Keangnam, Mễ Trì, Nam Từ Liêm, Hà Nội"),
        Location::new(7, "Văn phòng Hà Đông", "Tầng 3, Mê Linh Plaza, P. Hà Cầu, Hà Đông, Hà Nội"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_locations_have_unique_ids_and_no_coordinates() {
        let locations = seed_locations();
        let ids = locations.iter().map(Location::id).collect::<HashSet<_>>();

        assert_eq!(ids.len(), locations.len());
        assert!(locations.iter().all(Location::needs_resolution));
    }
}
